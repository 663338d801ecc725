//! Renewal batch processor.
//!
//! Scans for invoices whose billing period has elapsed and synthesizes the
//! successor invoice for the next period. Idempotent per (source invoice,
//! period): a source with an existing successor is skipped, so re-running
//! over an unchanged dataset creates nothing. One bad record never aborts
//! the run — failures are collected per invoice and successes commit
//! independently.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use fatura_billing::{build_renewal, is_renewal_due, next_period_start, Invoice};
use fatura_core::InvoiceId;
use fatura_infra::{CustomerStore, InvoiceStore, ServiceStore};

use crate::error::{EngineError, EngineResult};
use crate::retry::{with_retry, RetryPolicy};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRenewal {
    pub source_invoice_id: InvoiceId,
    pub renewal_invoice_id: InvoiceId,
    pub period_start: NaiveDate,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenewalFailure {
    pub source_invoice_id: InvoiceId,
    pub reason: String,
}

/// Per-run outcome summary, one entry per touched invoice.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenewalReport {
    /// Invoices inspected in this run.
    pub examined: usize,
    /// Successors created by this run.
    pub created: Vec<CreatedRenewal>,
    /// Due invoices skipped because their successor already exists (or the
    /// source vanished mid-run).
    pub skipped: usize,
    /// Due invoices whose renewal failed validation; the rest of the run
    /// proceeds regardless.
    pub failures: Vec<RenewalFailure>,
}

#[derive(Clone)]
pub struct RenewalProcessor {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
    services: Arc<dyn ServiceStore>,
    retry: RetryPolicy,
}

impl RenewalProcessor {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
        services: Arc<dyn ServiceStore>,
    ) -> Self {
        Self {
            invoices,
            customers,
            services,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, today: NaiveDate, now: DateTime<Utc>) -> EngineResult<RenewalReport> {
        let snapshot = with_retry(&self.retry, || self.invoices.list()).await?;
        let mut report = RenewalReport {
            examined: snapshot.len(),
            ..Default::default()
        };

        for source in &snapshot {
            if !is_renewal_due(source, today) {
                continue;
            }
            let source_id = source.id_typed();

            // Re-read: the source may have been deleted or cancelled while
            // this run was in flight. Detect and skip, never fail the run.
            let current = match self.invoices.get(source_id).await {
                Ok(Some(invoice)) => invoice,
                Ok(None) => {
                    tracing::debug!(invoice_id = %source_id, "source vanished mid-run, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    report.failures.push(RenewalFailure {
                        source_invoice_id: source_id,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !is_renewal_due(&current, today) {
                report.skipped += 1;
                continue;
            }

            match self.renew_one(&current, now).await {
                Ok(Some(created)) => report.created.push(created),
                Ok(None) => report.skipped += 1,
                Err(err) => {
                    tracing::warn!(invoice_id = %source_id, error = %err, "renewal failed");
                    report.failures.push(RenewalFailure {
                        source_invoice_id: source_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            created = report.created.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            "renewal run finished"
        );
        Ok(report)
    }

    /// Renew a single source invoice. `Ok(None)` means a successor already
    /// exists for this period.
    async fn renew_one(
        &self,
        source: &Invoice,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<CreatedRenewal>> {
        let existing = self.invoices.find_renewals_of(source.id_typed()).await?;
        if !existing.is_empty() {
            return Ok(None);
        }

        // References must still resolve; customers with only settled invoices
        // and services have no delete guard, so either may be gone by now.
        if self.customers.get(source.customer_id()).await?.is_none() {
            return Err(EngineError::not_found(format!(
                "customer {} no longer exists",
                source.customer_id()
            )));
        }
        for item in source.items() {
            if self.services.get(item.service_id()).await?.is_none() {
                return Err(EngineError::not_found(format!(
                    "service {} no longer exists",
                    item.service_id()
                )));
            }
        }

        let renewal = build_renewal(source, InvoiceId::new(), now)?;
        let period_start = next_period_start(source)
            .unwrap_or_else(|| renewal.items()[0].start_date());

        with_retry(&self.retry, || self.invoices.insert(&renewal)).await?;

        Ok(Some(CreatedRenewal {
            source_invoice_id: source.id_typed(),
            renewal_invoice_id: renewal.id_typed(),
            period_start,
        }))
    }
}
