use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fatura_core::{CustomerId, DomainError, DomainResult, Entity, InvoiceId};

use crate::calculator;
use crate::line_item::{InvoiceLineItem, LineItemDraft};
use crate::status::{resolved_status, InvoiceStatus};

/// Incoming invoice fields. Referential checks (customer and services must
/// exist) are the engine's job; everything shape-level is validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub description: Option<String>,
    pub items: Vec<LineItemDraft>,
}

/// Entity: Invoice. Owns its line items; `total_amount` is always derived
/// from them and never settable from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    customer_id: CustomerId,
    description: Option<String>,
    status: InvoiceStatus,
    is_renewal: bool,
    renewed_from: Option<InvoiceId>,
    created_at: DateTime<Utc>,
    items: Vec<InvoiceLineItem>,
    total_amount: Decimal,
}

impl Invoice {
    /// Build a new invoice from a draft: validates and materializes every
    /// line item, computes the total, starts `Pending`.
    pub fn new(id: InvoiceId, draft: InvoiceDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let items = build_items(draft.items)?;
        let total_amount = calculator::invoice_total(&items)?;
        Ok(Self {
            id,
            customer_id: draft.customer_id,
            description: draft.description,
            status: InvoiceStatus::Pending,
            is_renewal: false,
            renewed_from: None,
            created_at: now,
            items,
            total_amount,
        })
    }

    /// Build a renewal successor. Same construction path as [`Invoice::new`]
    /// but flagged and linked to its source.
    pub fn new_renewal(
        id: InvoiceId,
        source: InvoiceId,
        customer_id: CustomerId,
        description: Option<String>,
        items: Vec<InvoiceLineItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "invoice must have at least one line item",
            ));
        }
        let total_amount = calculator::invoice_total(&items)?;
        Ok(Self {
            id,
            customer_id,
            description,
            status: InvoiceStatus::Pending,
            is_renewal: true,
            renewed_from: Some(source),
            created_at: now,
            items,
            total_amount,
        })
    }

    /// Replace customer, description, and line items, recomputing the total.
    ///
    /// Status, renewal flags, and `created_at` are untouched — item edits are
    /// not lifecycle transitions.
    pub fn apply(
        &mut self,
        customer_id: CustomerId,
        description: Option<String>,
        items: Vec<InvoiceLineItem>,
    ) -> DomainResult<()> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "invoice must have at least one line item",
            ));
        }
        let total_amount = calculator::invoice_total(&items)?;
        self.customer_id = customer_id;
        self.description = description;
        self.items = items;
        self.total_amount = total_amount;
        Ok(())
    }

    /// Explicit paid transition.
    ///
    /// Idempotent for an already-`Paid` invoice (returns `Ok(false)` with no
    /// side effects, so revenue is never double-counted); rejected for a
    /// `Cancelled` one. Returns whether the status actually changed.
    pub fn mark_paid(&mut self) -> DomainResult<bool> {
        match self.status {
            InvoiceStatus::Paid => Ok(false),
            InvoiceStatus::Cancelled => Err(DomainError::conflict(
                "a cancelled invoice cannot be marked paid",
            )),
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                self.status = InvoiceStatus::Paid;
                Ok(true)
            }
        }
    }

    /// Explicit cancel transition. Allowed from any non-terminal state;
    /// cancelling twice is a no-op.
    pub fn cancel(&mut self) -> DomainResult<bool> {
        match self.status {
            InvoiceStatus::Cancelled => Ok(false),
            InvoiceStatus::Paid => Err(DomainError::conflict(
                "a paid invoice cannot be cancelled",
            )),
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                self.status = InvoiceStatus::Cancelled;
                Ok(true)
            }
        }
    }

    /// Persisted Pending→Overdue flip, used by the recomputation sweep.
    /// Returns whether anything changed.
    pub fn mark_overdue_if_elapsed(&mut self, today: NaiveDate) -> bool {
        if self.status == InvoiceStatus::Pending
            && resolved_status(self.status, self.due_date(), today) == InvoiceStatus::Overdue
        {
            self.status = InvoiceStatus::Overdue;
            return true;
        }
        false
    }

    /// Due date for overdue detection: the earliest line-item due date that
    /// is actually set.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.items.iter().filter_map(|item| item.due_date()).min()
    }

    /// Status as a read path should display it (see [`resolved_status`]).
    pub fn resolved_status(&self, today: NaiveDate) -> InvoiceStatus {
        resolved_status(self.status, self.due_date(), today)
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn is_renewal(&self) -> bool {
        self.is_renewal
    }

    pub fn renewed_from(&self) -> Option<InvoiceId> {
        self.renewed_from
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn items(&self) -> &[InvoiceLineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Materialize drafts into line items, assigning ids to new ones.
pub fn build_items(drafts: Vec<LineItemDraft>) -> DomainResult<Vec<InvoiceLineItem>> {
    if drafts.is_empty() {
        return Err(DomainError::validation(
            "invoice must have at least one line item",
        ));
    }
    drafts
        .into_iter()
        .map(|draft| {
            let id = draft.id.unwrap_or_default();
            InvoiceLineItem::new(id, draft)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::RenewalCycle;
    use fatura_core::ServiceId;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item_draft(price: &str, quantity: i64, vat: &str, cycle: RenewalCycle) -> LineItemDraft {
        LineItemDraft {
            id: None,
            service_id: ServiceId::new(),
            renewal_cycle: cycle,
            price: price.parse().unwrap(),
            quantity,
            vat: vat.parse().unwrap(),
            start_date: day(2024, 1, 1),
            due_date: None,
            description: None,
        }
    }

    fn invoice_with(items: Vec<LineItemDraft>) -> Invoice {
        Invoice::new(
            InvoiceId::new(),
            InvoiceDraft {
                customer_id: CustomerId::new(),
                description: None,
                items,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn total_is_the_sum_of_subtotals() {
        let invoice = invoice_with(vec![
            item_draft("100.00", 2, "18", RenewalCycle::Monthly), // 236.00
            item_draft("50.00", 1, "0", RenewalCycle::None),      // 50.00
        ]);
        assert_eq!(invoice.total_amount(), "286.00".parse().unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Pending);
        assert!(!invoice.is_renewal());
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let err = Invoice::new(
            InvoiceId::new(),
            InvoiceDraft {
                customer_id: CustomerId::new(),
                description: None,
                items: vec![],
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn due_date_is_earliest_set_item_due() {
        let mut one_shot = item_draft("10", 1, "0", RenewalCycle::None);
        one_shot.due_date = Some(day(2024, 1, 20));
        let invoice = invoice_with(vec![
            item_draft("10", 1, "0", RenewalCycle::Yearly), // due 2025-01-01
            one_shot,                                       // due 2024-01-20
            item_draft("10", 1, "0", RenewalCycle::None),   // no due date
        ]);
        assert_eq!(invoice.due_date(), Some(day(2024, 1, 20)));
    }

    #[test]
    fn mark_paid_is_idempotent_and_rejected_when_cancelled() {
        let mut invoice = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);

        assert!(invoice.mark_paid().unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        // Second call: success, no change.
        assert!(!invoice.mark_paid().unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        let mut cancelled = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        cancelled.cancel().unwrap();
        let err = cancelled.mark_paid().unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn overdue_invoice_can_still_be_paid() {
        let mut invoice = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        assert!(invoice.mark_overdue_if_elapsed(day(2030, 1, 1)));
        assert_eq!(invoice.status(), InvoiceStatus::Overdue);
        assert!(invoice.mark_paid().unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn cancel_rejects_paid_and_tolerates_repeat() {
        let mut invoice = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        assert!(invoice.cancel().unwrap());
        assert!(!invoice.cancel().unwrap());

        let mut paid = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        paid.mark_paid().unwrap();
        assert!(matches!(
            paid.cancel().unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn sweep_flip_only_applies_to_elapsed_pending() {
        let mut invoice = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        // Due 2024-02-01; not elapsed on the due day itself.
        assert!(!invoice.mark_overdue_if_elapsed(day(2024, 2, 1)));
        assert!(invoice.mark_overdue_if_elapsed(day(2024, 2, 2)));
        // Already overdue: nothing further to do.
        assert!(!invoice.mark_overdue_if_elapsed(day(2024, 3, 1)));
    }

    #[test]
    fn resolved_status_reads_overdue_before_the_sweep_runs() {
        let invoice = invoice_with(vec![item_draft("10", 1, "0", RenewalCycle::Monthly)]);
        assert_eq!(invoice.status(), InvoiceStatus::Pending);
        assert_eq!(
            invoice.resolved_status(day(2024, 3, 1)),
            InvoiceStatus::Overdue
        );
    }

    #[test]
    fn apply_recomputes_total_and_preserves_lifecycle() {
        let mut invoice = invoice_with(vec![item_draft("100.00", 1, "18", RenewalCycle::Monthly)]);
        invoice.mark_paid().unwrap();

        let created = invoice.created_at();
        let customer = invoice.customer_id();
        let items = build_items(vec![item_draft("200.00", 1, "0", RenewalCycle::Monthly)]).unwrap();
        invoice
            .apply(customer, Some("updated".to_string()), items)
            .unwrap();

        assert_eq!(invoice.total_amount(), "200.00".parse().unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.created_at(), created);
    }
}
