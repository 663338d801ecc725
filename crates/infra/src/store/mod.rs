//! Entity Store ports.
//!
//! Contract notes (relied on by the engine, see SPEC_FULL §5):
//! - every write is atomic per entity; readers never observe a half-applied
//!   record (an invoice's stored total always matches its stored items),
//! - concurrent writes to the same entity serialize with last-writer wins,
//! - the store holds no derived state; all queries are read-through.

use thiserror::Error;

use fatura_billing::Invoice;
use fatura_catalog::Service;
use fatura_core::{CustomerId, InvoiceId, ServiceId};
use fatura_customers::Customer;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Storage failure, as seen by the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or timed out. The only class the
    /// engine may retry, and only from idempotent batch operations.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness index rejected the write. The engine checks uniqueness
    /// before writing; this is the backstop for racing writers.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// The backend failed the operation for a non-transient reason.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[async_trait::async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError>;
    async fn update(&self, customer: &Customer) -> Result<(), StoreError>;
    /// Returns whether a record was actually removed.
    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError>;
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    /// All customers, oldest first.
    async fn list(&self) -> Result<Vec<Customer>, StoreError>;
    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;
}

#[async_trait::async_trait]
pub trait ServiceStore: Send + Sync {
    async fn insert(&self, service: &Service) -> Result<(), StoreError>;
    async fn update(&self, service: &Service) -> Result<(), StoreError>;
    async fn delete(&self, id: ServiceId) -> Result<bool, StoreError>;
    async fn get(&self, id: ServiceId) -> Result<Option<Service>, StoreError>;
    async fn list(&self) -> Result<Vec<Service>, StoreError>;
    /// Case-insensitive name lookup.
    async fn find_by_name(&self, name: &str) -> Result<Option<Service>, StoreError>;
}

#[async_trait::async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: &Invoice) -> Result<(), StoreError>;
    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError>;
    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError>;
    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
    async fn list(&self) -> Result<Vec<Invoice>, StoreError>;
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Invoice>, StoreError>;
    /// Successors generated from the given invoice by the renewal processor.
    async fn find_renewals_of(&self, source: InvoiceId) -> Result<Vec<Invoice>, StoreError>;
}
