//! Renewal-period arithmetic.
//!
//! Pure helpers consumed by the engine's batch processor: which invoices are
//! due for renewal, and what their successor looks like. An invoice renews as
//! a whole — all recurring items advance together one cycle — once its
//! earliest recurring period has elapsed. Cancelled invoices never renew;
//! cancellation is the signal that the subscription ended.

use chrono::{DateTime, NaiveDate, Utc};

use fatura_core::{DomainResult, InvoiceId, LineItemId};

use crate::invoice::Invoice;
use crate::status::InvoiceStatus;

/// Start of the period a successor invoice would cover: the earliest
/// recurring item's period end. `None` when nothing on the invoice recurs.
pub fn next_period_start(invoice: &Invoice) -> Option<NaiveDate> {
    invoice
        .items()
        .iter()
        .filter_map(|item| item.period_end())
        .min()
}

/// Whether the invoice's current billing period has elapsed and a successor
/// should exist.
pub fn is_renewal_due(invoice: &Invoice, today: NaiveDate) -> bool {
    if invoice.status() == InvoiceStatus::Cancelled {
        return false;
    }
    match next_period_start(invoice) {
        Some(period_start) => period_start <= today,
        None => false,
    }
}

/// Build the successor invoice for the next billing period.
///
/// Recurring items are copied with `start_date`/`due_date` advanced one cycle
/// and price/quantity carried over; one-shot items are not carried. The
/// source is read, never mutated.
pub fn build_renewal(
    source: &Invoice,
    id: InvoiceId,
    now: DateTime<Utc>,
) -> DomainResult<Invoice> {
    let mut items = Vec::new();
    for item in source.items() {
        if let Some(advanced) = item.advanced_one_cycle(LineItemId::new()) {
            items.push(advanced?);
        }
    }

    Invoice::new_renewal(
        id,
        source.id_typed(),
        source.customer_id(),
        source.description().map(str::to_string),
        items,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceDraft;
    use crate::line_item::{LineItemDraft, RenewalCycle};
    use fatura_core::{CustomerId, ServiceId};
    use rust_decimal::Decimal;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(cycle: RenewalCycle, start: NaiveDate) -> LineItemDraft {
        LineItemDraft {
            id: None,
            service_id: ServiceId::new(),
            renewal_cycle: cycle,
            price: Decimal::new(9900, 2),
            quantity: 1,
            vat: Decimal::from(18),
            start_date: start,
            due_date: None,
            description: None,
        }
    }

    fn invoice(items: Vec<LineItemDraft>) -> Invoice {
        Invoice::new(
            InvoiceId::new(),
            InvoiceDraft {
                customer_id: CustomerId::new(),
                description: Some("hosting".to_string()),
                items,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn renewal_is_due_once_the_period_has_elapsed() {
        let inv = invoice(vec![item(RenewalCycle::Monthly, day(2024, 1, 1))]);
        assert!(!is_renewal_due(&inv, day(2024, 1, 31)));
        assert!(is_renewal_due(&inv, day(2024, 2, 1)));
        assert!(is_renewal_due(&inv, day(2024, 3, 15)));
    }

    #[test]
    fn one_shot_invoices_never_renew() {
        let inv = invoice(vec![item(RenewalCycle::None, day(2024, 1, 1))]);
        assert!(!is_renewal_due(&inv, day(2030, 1, 1)));
        assert_eq!(next_period_start(&inv), None);
    }

    #[test]
    fn cancelled_invoices_never_renew() {
        let mut inv = invoice(vec![item(RenewalCycle::Monthly, day(2024, 1, 1))]);
        inv.cancel().unwrap();
        assert!(!is_renewal_due(&inv, day(2030, 1, 1)));
    }

    #[test]
    fn paid_invoices_still_renew() {
        let mut inv = invoice(vec![item(RenewalCycle::Monthly, day(2024, 1, 1))]);
        inv.mark_paid().unwrap();
        assert!(is_renewal_due(&inv, day(2024, 2, 1)));
    }

    #[test]
    fn successor_advances_recurring_items_and_drops_one_shot_ones() {
        let inv = invoice(vec![
            item(RenewalCycle::Monthly, day(2024, 1, 1)),
            item(RenewalCycle::None, day(2024, 1, 1)),
        ]);

        let renewal = build_renewal(&inv, InvoiceId::new(), Utc::now()).unwrap();
        assert!(renewal.is_renewal());
        assert_eq!(renewal.renewed_from(), Some(inv.id_typed()));
        assert_eq!(renewal.status(), InvoiceStatus::Pending);
        assert_eq!(renewal.customer_id(), inv.customer_id());
        assert_eq!(renewal.items().len(), 1);

        let next = &renewal.items()[0];
        assert_eq!(next.start_date(), day(2024, 2, 1));
        assert_eq!(next.due_date(), Some(day(2024, 3, 1)));
        assert_eq!(next.price(), Decimal::new(9900, 2));
    }

    #[test]
    fn successor_period_matches_next_period_start() {
        let inv = invoice(vec![item(RenewalCycle::Yearly, day(2024, 1, 1))]);
        let renewal = build_renewal(&inv, InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(
            next_period_start(&inv),
            Some(renewal.items()[0].start_date())
        );
        assert_eq!(renewal.items()[0].start_date(), day(2025, 1, 1));
    }
}
