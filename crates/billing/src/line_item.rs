use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fatura_core::{DomainError, DomainResult, LineItemId, ServiceId};

use crate::calculator;
use crate::dates;

/// Recurrence period of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenewalCycle {
    /// One-shot: the item never renews.
    #[default]
    None,
    Monthly,
    Yearly,
}

impl RenewalCycle {
    /// Cycle length in months; `None` for one-shot items.
    pub fn months(self) -> Option<u32> {
        match self {
            RenewalCycle::None => None,
            RenewalCycle::Monthly => Some(1),
            RenewalCycle::Yearly => Some(12),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenewalCycle::None => "none",
            RenewalCycle::Monthly => "monthly",
            RenewalCycle::Yearly => "yearly",
        }
    }
}

/// Incoming line-item fields.
///
/// `id` is present when the caller is editing an item that already exists on
/// the invoice; new items arrive without one. `quantity` is widened here so a
/// non-positive value surfaces as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    #[serde(default)]
    pub id: Option<LineItemId>,
    pub service_id: ServiceId,
    #[serde(default)]
    pub renewal_cycle: RenewalCycle,
    pub price: Decimal,
    pub quantity: i64,
    pub vat: Decimal,
    #[serde(deserialize_with = "dates::deserialize_required")]
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "dates::deserialize_optional")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single line of an invoice. Owned exclusively by its invoice.
///
/// `price` is the unit price in the item's *current* cycle unit (a yearly
/// item carries a yearly price). `due_date` is derived as
/// `start_date + cycle` for recurring items; one-shot items keep whatever the
/// caller supplied, which may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    id: LineItemId,
    service_id: ServiceId,
    renewal_cycle: RenewalCycle,
    price: Decimal,
    quantity: u32,
    vat: Decimal,
    start_date: NaiveDate,
    due_date: Option<NaiveDate>,
    description: Option<String>,
}

impl InvoiceLineItem {
    /// Build a line item from a draft, validating amounts and deriving the
    /// due date for recurring cycles.
    pub fn new(id: LineItemId, draft: LineItemDraft) -> DomainResult<Self> {
        if draft.quantity < 1 {
            return Err(DomainError::validation(
                "line item quantity must be at least 1",
            ));
        }
        let quantity = u32::try_from(draft.quantity)
            .map_err(|_| DomainError::validation("line item quantity out of range"))?;

        // Runs the amount checks; the subtotal itself is recomputed by the
        // invoice when totalling.
        calculator::line_subtotal(draft.price, quantity, draft.vat)?;

        let due_date = match draft.renewal_cycle.months() {
            Some(months) => Some(advance(draft.start_date, months)?),
            None => draft.due_date,
        };

        Ok(Self {
            id,
            service_id: draft.service_id,
            renewal_cycle: draft.renewal_cycle,
            price: draft.price,
            quantity,
            vat: draft.vat,
            start_date: draft.start_date,
            due_date,
            description: draft.description,
        })
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn renewal_cycle(&self) -> RenewalCycle {
        self.renewal_cycle
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn vat(&self) -> Decimal {
        self.vat
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `price * quantity * (1 + vat/100)`.
    pub fn subtotal(&self) -> DomainResult<Decimal> {
        calculator::line_subtotal(self.price, self.quantity, self.vat)
    }

    /// End of the current billing period; `None` for one-shot items.
    pub fn period_end(&self) -> Option<NaiveDate> {
        let months = self.renewal_cycle.months()?;
        advance(self.start_date, months).ok()
    }

    /// Copy of this item shifted one cycle forward, used by the renewal
    /// processor. `None` for one-shot items.
    pub fn advanced_one_cycle(&self, id: LineItemId) -> Option<DomainResult<Self>> {
        let months = self.renewal_cycle.months()?;
        Some(advance(self.start_date, months).and_then(|next_start| {
            let next_due = advance(next_start, months)?;
            Ok(Self {
                id,
                service_id: self.service_id,
                renewal_cycle: self.renewal_cycle,
                price: self.price,
                quantity: self.quantity,
                vat: self.vat,
                start_date: next_start,
                due_date: Some(next_due),
                description: self.description.clone(),
            })
        }))
    }
}

fn advance(date: NaiveDate, months: u32) -> DomainResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| DomainError::validation(format!("date out of range: {date} + {months}mo")))
}
