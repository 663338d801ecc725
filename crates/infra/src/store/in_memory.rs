//! In-memory entity store for tests/dev.
//!
//! A whole-map write lock per entity kind gives the per-entity write
//! serialization the engine requires; clones on the way out keep readers
//! isolated from later writes.

use std::collections::HashMap;
use std::sync::RwLock;

use fatura_billing::Invoice;
use fatura_catalog::Service;
use fatura_core::{CustomerId, InvoiceId, ServiceId};
use fatura_customers::Customer;

use super::{CustomerStore, InvoiceStore, ServiceStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    services: RwLock<HashMap<ServiceId, Service>>,
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl CustomerStore for InMemoryStore {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut map = self.customers.write().map_err(|_| poisoned())?;
        map.insert(customer.id_typed(), customer.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut map = self.customers.write().map_err(|_| poisoned())?;
        map.insert(customer.id_typed(), customer.clone());
        Ok(())
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        let mut map = self.customers.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let map = self.customers.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let map = self.customers.read().map_err(|_| poisoned())?;
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by_key(|c| c.created_at());
        Ok(all)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let needle = email.to_lowercase();
        let map = self.customers.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .find(|c| c.email().to_lowercase() == needle)
            .cloned())
    }
}

#[async_trait::async_trait]
impl ServiceStore for InMemoryStore {
    async fn insert(&self, service: &Service) -> Result<(), StoreError> {
        let mut map = self.services.write().map_err(|_| poisoned())?;
        map.insert(service.id_typed(), service.clone());
        Ok(())
    }

    async fn update(&self, service: &Service) -> Result<(), StoreError> {
        let mut map = self.services.write().map_err(|_| poisoned())?;
        map.insert(service.id_typed(), service.clone());
        Ok(())
    }

    async fn delete(&self, id: ServiceId) -> Result<bool, StoreError> {
        let mut map = self.services.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn get(&self, id: ServiceId) -> Result<Option<Service>, StoreError> {
        let map = self.services.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Service>, StoreError> {
        let map = self.services.read().map_err(|_| poisoned())?;
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by_key(|s| s.created_at());
        Ok(all)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Service>, StoreError> {
        let needle = name.to_lowercase();
        let map = self.services.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .find(|s| s.name().to_lowercase() == needle)
            .cloned())
    }
}

#[async_trait::async_trait]
impl InvoiceStore for InMemoryStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut map = self.invoices.write().map_err(|_| poisoned())?;
        map.insert(invoice.id_typed(), invoice.clone());
        Ok(())
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut map = self.invoices.write().map_err(|_| poisoned())?;
        map.insert(invoice.id_typed(), invoice.clone());
        Ok(())
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let mut map = self.invoices.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let map = self.invoices.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Invoice>, StoreError> {
        let map = self.invoices.read().map_err(|_| poisoned())?;
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by_key(|i| i.created_at());
        Ok(all)
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Invoice>, StoreError> {
        let map = self.invoices.read().map_err(|_| poisoned())?;
        let mut matching: Vec<_> = map
            .values()
            .filter(|i| i.customer_id() == customer_id)
            .cloned()
            .collect();
        matching.sort_by_key(|i| i.created_at());
        Ok(matching)
    }

    async fn find_renewals_of(&self, source: InvoiceId) -> Result<Vec<Invoice>, StoreError> {
        let map = self.invoices.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|i| i.renewed_from() == Some(source))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fatura_customers::CustomerDraft;

    fn customer(email: &str) -> Customer {
        Customer::new(
            CustomerId::new(),
            CustomerDraft {
                first_name: "Test".to_string(),
                last_name: "Customer".to_string(),
                email: email.to_string(),
                phone: None,
                tax_office: None,
                tax_number: None,
                address: None,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn customer_round_trip() {
        let store = InMemoryStore::new();
        let c = customer("a@example.com");
        CustomerStore::insert(&store, &c).await.unwrap();

        let loaded = CustomerStore::get(&store, c.id_typed()).await.unwrap();
        assert_eq!(loaded, Some(c.clone()));

        assert!(CustomerStore::delete(&store, c.id_typed()).await.unwrap());
        assert!(!CustomerStore::delete(&store, c.id_typed()).await.unwrap());
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let store = InMemoryStore::new();
        let c = customer("Billing@Example.COM");
        CustomerStore::insert(&store, &c).await.unwrap();

        let found = store.find_by_email("billing@example.com").await.unwrap();
        assert_eq!(found.map(|c| c.id_typed()), Some(c.id_typed()));
        assert!(store.find_by_email("other@example.com").await.unwrap().is_none());
    }
}
