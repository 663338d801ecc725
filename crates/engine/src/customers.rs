//! Customer operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use fatura_core::{CustomerId, DomainError};
use fatura_customers::{Customer, CustomerDraft};
use fatura_infra::{CustomerStore, InvoiceStore};

use crate::error::EngineResult;
use crate::rules;

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerStore>, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self { customers, invoices }
    }

    pub async fn create(&self, draft: CustomerDraft, now: DateTime<Utc>) -> EngineResult<Customer> {
        draft.validate()?;
        rules::ensure_email_unique(self.customers.as_ref(), &draft.email, None).await?;

        let customer = Customer::new(CustomerId::new(), draft, now)?;
        self.customers.insert(&customer).await?;
        tracing::info!(customer_id = %customer.id_typed(), "customer created");
        Ok(customer)
    }

    pub async fn update(
        &self,
        id: CustomerId,
        draft: CustomerDraft,
        now: DateTime<Utc>,
    ) -> EngineResult<Customer> {
        let mut customer = self
            .customers
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {id} does not exist")))?;

        draft.validate()?;
        rules::ensure_email_unique(self.customers.as_ref(), &draft.email, Some(id)).await?;

        customer.apply(draft, now)?;
        self.customers.update(&customer).await?;
        Ok(customer)
    }

    /// Delete, guarded: refused while any of the customer's invoices is
    /// financially open.
    pub async fn delete(&self, id: CustomerId) -> EngineResult<()> {
        if self.customers.get(id).await?.is_none() {
            return Err(DomainError::not_found(format!("customer {id} does not exist")).into());
        }
        rules::ensure_customer_deletable(self.invoices.as_ref(), id).await?;

        self.customers.delete(id).await?;
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    pub async fn get(&self, id: CustomerId) -> EngineResult<Customer> {
        self.customers
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {id} does not exist")).into())
    }

    pub async fn list(&self) -> EngineResult<Vec<Customer>> {
        Ok(self.customers.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use fatura_billing::{Invoice, InvoiceDraft, LineItemDraft, RenewalCycle};
    use fatura_catalog::{Service, ServiceDraft};
    use fatura_core::{InvoiceId, ServiceId};
    use fatura_infra::{InMemoryStore, ServiceStore};
    use rust_decimal::Decimal;

    fn draft(email: &str) -> CustomerDraft {
        CustomerDraft {
            first_name: "Mehmet".to_string(),
            last_name: "Kaya".to_string(),
            email: email.to_string(),
            phone: None,
            tax_office: None,
            tax_number: None,
            address: None,
            description: None,
        }
    }

    fn service_fixture() -> fatura_core::ServiceId {
        ServiceId::new()
    }

    async fn seed_invoice(
        store: &InMemoryStore,
        customer_id: CustomerId,
        service_id: ServiceId,
    ) -> Invoice {
        let service = Service::new(
            service_id,
            ServiceDraft {
                name: format!("svc-{service_id}"),
                price: Decimal::from(100),
            },
            Utc::now(),
        )
        .unwrap();
        ServiceStore::insert(store, &service).await.unwrap();

        let invoice = Invoice::new(
            InvoiceId::new(),
            InvoiceDraft {
                customer_id,
                description: None,
                items: vec![LineItemDraft {
                    id: None,
                    service_id,
                    renewal_cycle: RenewalCycle::Monthly,
                    price: Decimal::from(100),
                    quantity: 1,
                    vat: Decimal::from(18),
                    start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    due_date: None,
                    description: None,
                }],
            },
            Utc::now(),
        )
        .unwrap();
        InvoiceStore::insert(store, &invoice).await.unwrap();
        invoice
    }

    fn service_over(store: Arc<InMemoryStore>) -> CustomerService {
        CustomerService::new(store.clone(), store)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_case_insensitively() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service_over(store);

        svc.create(draft("ops@acme.com"), Utc::now()).await.unwrap();
        let err = svc
            .create(draft("OPS@ACME.COM"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_own_email_but_rejects_anothers() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service_over(store);

        let a = svc.create(draft("a@acme.com"), Utc::now()).await.unwrap();
        svc.create(draft("b@acme.com"), Utc::now()).await.unwrap();

        // Re-submitting your own email is fine.
        svc.update(a.id_typed(), draft("a@acme.com"), Utc::now())
            .await
            .unwrap();

        let err = svc
            .update(a.id_typed(), draft("b@acme.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_blocked_by_open_invoices_until_settled() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service_over(store.clone());

        let customer = svc.create(draft("c@acme.com"), Utc::now()).await.unwrap();
        let mut invoice = seed_invoice(&store, customer.id_typed(), service_fixture()).await;

        let err = svc.delete(customer.id_typed()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::ConstraintViolation(_))
        ));

        // Settle the invoice; the guard lifts.
        invoice.mark_paid().unwrap();
        InvoiceStore::update(store.as_ref(), &invoice).await.unwrap();
        svc.delete(customer.id_typed()).await.unwrap();
        assert!(svc.get(customer.id_typed()).await.is_err());
    }

    #[tokio::test]
    async fn delete_is_blocked_while_overdue_too() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service_over(store.clone());

        let customer = svc.create(draft("d@acme.com"), Utc::now()).await.unwrap();
        let mut invoice = seed_invoice(&store, customer.id_typed(), service_fixture()).await;
        invoice.mark_overdue_if_elapsed(chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        InvoiceStore::update(store.as_ref(), &invoice).await.unwrap();

        let err = svc.delete(customer.id_typed()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::ConstraintViolation(_))
        ));

        invoice.cancel().unwrap();
        InvoiceStore::update(store.as_ref(), &invoice).await.unwrap();
        svc.delete(customer.id_typed()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_customer_reads_as_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let svc = service_over(store);
        let err = svc.get(CustomerId::new()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::NotFound(_))
        ));
    }
}
