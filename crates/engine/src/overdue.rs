//! Overdue recomputation sweep.
//!
//! Persists the Pending→Overdue flip for invoices whose due date has
//! elapsed, so stored listings agree with what the resolver shows on reads.
//! Safe to re-run at any time; a second pass over an unchanged dataset
//! writes nothing.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use fatura_infra::InvoiceStore;

use crate::error::EngineResult;
use crate::retry::{with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReport {
    pub examined: usize,
    pub marked_overdue: usize,
}

#[derive(Clone)]
pub struct OverdueSweep {
    invoices: Arc<dyn InvoiceStore>,
    retry: RetryPolicy,
}

impl OverdueSweep {
    pub fn new(invoices: Arc<dyn InvoiceStore>) -> Self {
        Self {
            invoices,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, today: NaiveDate) -> EngineResult<OverdueReport> {
        let snapshot = with_retry(&self.retry, || self.invoices.list()).await?;
        let mut report = OverdueReport {
            examined: snapshot.len(),
            marked_overdue: 0,
        };

        for stale in snapshot {
            // Work on a fresh read per invoice; a row deleted or settled
            // mid-run is simply skipped.
            let Some(mut invoice) = self.invoices.get(stale.id_typed()).await? else {
                continue;
            };
            if invoice.mark_overdue_if_elapsed(today) {
                with_retry(&self.retry, || self.invoices.update(&invoice)).await?;
                report.marked_overdue += 1;
            }
        }

        tracing::info!(
            examined = report.examined,
            marked_overdue = report.marked_overdue,
            "overdue sweep finished"
        );
        Ok(report)
    }
}
