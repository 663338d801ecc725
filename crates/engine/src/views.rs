//! Read models handed to the HTTP boundary.
//!
//! A stored invoice's status may lag the calendar between sweep runs, so
//! every read path re-resolves it before exposure.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use fatura_billing::{Invoice, InvoiceLineItem, InvoiceStatus};
use fatura_core::{CustomerId, InvoiceId};

/// Invoice as exposed on read paths: stored fields plus the resolved status
/// and the invoice-level due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub description: Option<String>,
    pub status: InvoiceStatus,
    pub is_renewal: bool,
    pub renewed_from: Option<InvoiceId>,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<InvoiceLineItem>,
    pub total_amount: Decimal,
}

impl InvoiceView {
    pub fn of(invoice: &Invoice, today: NaiveDate) -> Self {
        Self {
            id: invoice.id_typed(),
            customer_id: invoice.customer_id(),
            description: invoice.description().map(str::to_string),
            status: invoice.resolved_status(today),
            is_renewal: invoice.is_renewal(),
            renewed_from: invoice.renewed_from(),
            created_at: invoice.created_at(),
            due_date: invoice.due_date(),
            items: invoice.items().to_vec(),
            total_amount: invoice.total_amount(),
        }
    }
}
