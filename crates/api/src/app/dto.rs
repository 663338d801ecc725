//! Response envelopes and JSON mapping helpers.
//!
//! Request bodies deserialize straight into the domain drafts
//! (`CustomerDraft`, `ServiceDraft`, `InvoiceDraft`) — the engine validates;
//! the boundary only shapes responses.

use serde::Serialize;

/// Plain list payload: `{ "items": [...], "totalCount": n }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total_count = items.len();
        Self { items, total_count }
    }
}
