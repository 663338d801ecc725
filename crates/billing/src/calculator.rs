//! Line-item calculator: pure, deterministic money arithmetic.
//!
//! `subtotal = price * quantity * (1 + vat/100)`, all in `Decimal`. Invalid
//! inputs fail fast with a validation error; nothing is clamped. Checked
//! multiplication/addition throughout — an overflowing amount is an error,
//! not a wrapped number.

use rust_decimal::Decimal;

use fatura_core::{DomainError, DomainResult};

use crate::line_item::{InvoiceLineItem, RenewalCycle};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Subtotal for a single line: `price * quantity * (1 + vat/100)`.
pub fn line_subtotal(price: Decimal, quantity: u32, vat: Decimal) -> DomainResult<Decimal> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "line item price must not be negative (got {price})"
        )));
    }
    if quantity < 1 {
        return Err(DomainError::validation(
            "line item quantity must be at least 1",
        ));
    }
    if vat < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "line item vat must not be negative (got {vat})"
        )));
    }

    let vat_factor = Decimal::ONE + vat / Decimal::ONE_HUNDRED;
    price
        .checked_mul(Decimal::from(quantity))
        .and_then(|net| net.checked_mul(vat_factor))
        .ok_or_else(|| DomainError::validation("line item subtotal overflow"))
}

/// Invoice total: sum of all line subtotals.
pub fn invoice_total(items: &[InvoiceLineItem]) -> DomainResult<Decimal> {
    let mut total = Decimal::ZERO;
    for item in items {
        let subtotal = line_subtotal(item.price(), item.quantity(), item.vat())?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| DomainError::validation("invoice total overflow"))?;
    }
    Ok(total)
}

/// Rescale a unit price between billing cycles.
///
/// Monthly→Yearly multiplies by 12, Yearly→Monthly divides by 12; every other
/// pair (same cycle, or to/from one-shot) leaves the price untouched. The
/// result keeps full `Decimal` precision — rounding only ever happens in
/// subtotals — so toggling a cycle back and forth does not drift.
pub fn renormalized_price(
    price: Decimal,
    from: RenewalCycle,
    to: RenewalCycle,
) -> DomainResult<Decimal> {
    match (from, to) {
        (RenewalCycle::Monthly, RenewalCycle::Yearly) => price
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| DomainError::validation("price overflow converting monthly to yearly")),
        (RenewalCycle::Yearly, RenewalCycle::Monthly) => Ok(price / MONTHS_PER_YEAR),
        _ => Ok(price),
    }
}
