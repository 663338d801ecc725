//! Invoice operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use fatura_billing::{
    build_items, renormalized_price, Invoice, InvoiceDraft, InvoiceStatus, RenewalCycle,
};
use fatura_core::{DomainError, InvoiceId, LineItemId};
use fatura_infra::{CustomerStore, InvoiceStore, ServiceStore};

use crate::error::EngineResult;
use crate::rules;
use crate::views::InvoiceView;

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
    services: Arc<dyn ServiceStore>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
        services: Arc<dyn ServiceStore>,
    ) -> Self {
        Self {
            invoices,
            customers,
            services,
        }
    }

    pub async fn create(&self, draft: InvoiceDraft, now: DateTime<Utc>) -> EngineResult<Invoice> {
        rules::ensure_invoice_references(self.customers.as_ref(), self.services.as_ref(), &draft)
            .await?;

        let invoice = Invoice::new(InvoiceId::new(), draft, now)?;
        self.invoices.insert(&invoice).await?;
        tracing::info!(invoice_id = %invoice.id_typed(), total = %invoice.total_amount(), "invoice created");
        Ok(invoice)
    }

    /// Update customer, description, and line items. The total is recomputed
    /// before persisting; lifecycle fields are untouched.
    ///
    /// When an existing item comes back with a different renewal cycle and an
    /// untouched price, the unit price is renormalized between cycle units
    /// (monthly ×12 to yearly, yearly ÷12 to monthly). An explicitly repriced
    /// item wins over the conversion.
    pub async fn update(&self, id: InvoiceId, mut draft: InvoiceDraft) -> EngineResult<Invoice> {
        let mut invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("invoice {id} does not exist")))?;

        let previous: HashMap<LineItemId, (Decimal, RenewalCycle)> = invoice
            .items()
            .iter()
            .map(|item| (item.id_typed(), (item.price(), item.renewal_cycle())))
            .collect();

        for item in &mut draft.items {
            let Some(&(prev_price, prev_cycle)) =
                item.id.and_then(|item_id| previous.get(&item_id))
            else {
                continue;
            };
            if item.renewal_cycle != prev_cycle && item.price == prev_price {
                item.price = renormalized_price(prev_price, prev_cycle, item.renewal_cycle)?;
            }
        }

        rules::ensure_invoice_references(self.customers.as_ref(), self.services.as_ref(), &draft)
            .await?;

        let items = build_items(draft.items)?;
        invoice.apply(draft.customer_id, draft.description, items)?;
        self.invoices.update(&invoice).await?;
        Ok(invoice)
    }

    /// Delete an invoice together with the line items it owns.
    pub async fn delete(&self, id: InvoiceId) -> EngineResult<()> {
        if !self.invoices.delete(id).await? {
            return Err(DomainError::not_found(format!("invoice {id} does not exist")).into());
        }
        Ok(())
    }

    /// Explicit paid transition (idempotent; see the status machine).
    pub async fn mark_paid(&self, id: InvoiceId) -> EngineResult<Invoice> {
        let mut invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("invoice {id} does not exist")))?;

        if invoice.mark_paid()? {
            self.invoices.update(&invoice).await?;
            tracing::info!(invoice_id = %id, "invoice marked paid");
        }
        Ok(invoice)
    }

    /// Explicit cancel transition.
    pub async fn cancel(&self, id: InvoiceId) -> EngineResult<Invoice> {
        let mut invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("invoice {id} does not exist")))?;

        if invoice.cancel()? {
            self.invoices.update(&invoice).await?;
            tracing::info!(invoice_id = %id, "invoice cancelled");
        }
        Ok(invoice)
    }

    pub async fn get(&self, id: InvoiceId, today: NaiveDate) -> EngineResult<InvoiceView> {
        let invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("invoice {id} does not exist")))?;
        Ok(InvoiceView::of(&invoice, today))
    }

    pub async fn list(&self, today: NaiveDate) -> EngineResult<Vec<InvoiceView>> {
        let invoices = self.invoices.list().await?;
        Ok(invoices
            .iter()
            .map(|invoice| InvoiceView::of(invoice, today))
            .collect())
    }

    /// Still-pending invoices whose due date is today or later, soonest due
    /// first.
    pub async fn upcoming(&self, today: NaiveDate) -> EngineResult<Vec<InvoiceView>> {
        let mut views: Vec<_> = self
            .list(today)
            .await?
            .into_iter()
            .filter(|view| {
                view.status == InvoiceStatus::Pending
                    && view.due_date.is_some_and(|due| due >= today)
            })
            .collect();
        views.sort_by_key(|view| view.due_date);
        Ok(views)
    }

    /// Invoices reading as overdue, most overdue first.
    pub async fn overdue(&self, today: NaiveDate) -> EngineResult<Vec<InvoiceView>> {
        let mut views: Vec<_> = self
            .list(today)
            .await?
            .into_iter()
            .filter(|view| view.status == InvoiceStatus::Overdue)
            .collect();
        views.sort_by_key(|view| view.due_date);
        Ok(views)
    }
}
