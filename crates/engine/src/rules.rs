//! Cross-entity validation rules, evaluated against the store before every
//! mutation. Field-shape rules live on the entities themselves; everything
//! here needs to see other records.

use fatura_billing::InvoiceDraft;
use fatura_core::{CustomerId, DomainError, ServiceId};
use fatura_infra::{CustomerStore, InvoiceStore, ServiceStore};

use crate::error::EngineResult;

/// Customer emails are unique dataset-wide, case-insensitively.
pub async fn ensure_email_unique(
    customers: &dyn CustomerStore,
    email: &str,
    exclude: Option<CustomerId>,
) -> EngineResult<()> {
    if let Some(existing) = customers.find_by_email(email).await? {
        if Some(existing.id_typed()) != exclude {
            return Err(DomainError::conflict(format!(
                "a customer with email {email:?} already exists"
            ))
            .into());
        }
    }
    Ok(())
}

/// Service names are unique dataset-wide, case-insensitively.
pub async fn ensure_service_name_unique(
    services: &dyn ServiceStore,
    name: &str,
    exclude: Option<ServiceId>,
) -> EngineResult<()> {
    if let Some(existing) = services.find_by_name(name).await? {
        if Some(existing.id_typed()) != exclude {
            return Err(DomainError::conflict(format!(
                "a service named {name:?} already exists"
            ))
            .into());
        }
    }
    Ok(())
}

/// A customer cannot be deleted while any of its invoices is financially
/// open (Pending or Overdue).
pub async fn ensure_customer_deletable(
    invoices: &dyn InvoiceStore,
    customer_id: CustomerId,
) -> EngineResult<()> {
    let existing = invoices.list_by_customer(customer_id).await?;
    if existing.iter().any(|invoice| invoice.status().is_open()) {
        return Err(DomainError::constraint(
            "customer has pending or overdue invoices",
        )
        .into());
    }
    Ok(())
}

/// Every reference on an invoice draft must resolve: the customer, and the
/// service of every line item.
pub async fn ensure_invoice_references(
    customers: &dyn CustomerStore,
    services: &dyn ServiceStore,
    draft: &InvoiceDraft,
) -> EngineResult<()> {
    if customers.get(draft.customer_id).await?.is_none() {
        return Err(DomainError::not_found(format!(
            "customer {} does not exist",
            draft.customer_id
        ))
        .into());
    }
    for item in &draft.items {
        if services.get(item.service_id).await?.is_none() {
            return Err(DomainError::not_found(format!(
                "service {} does not exist",
                item.service_id
            ))
            .into());
        }
    }
    Ok(())
}
