//! Invoicing domain module.
//!
//! Business rules for invoices and their line items, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): the line-item
//! calculator, the status lifecycle, and renewal-period arithmetic.

pub mod calculator;
pub mod dates;
pub mod invoice;
pub mod line_item;
pub mod renewal;
pub mod status;

pub use calculator::{invoice_total, line_subtotal, renormalized_price};
pub use invoice::{build_items, Invoice, InvoiceDraft};
pub use line_item::{InvoiceLineItem, LineItemDraft, RenewalCycle};
pub use renewal::{build_renewal, is_renewal_due, next_period_start};
pub use status::{resolved_status, InvoiceStatus};
