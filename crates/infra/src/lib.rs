//! Infrastructure layer: entity-store ports and their adapters.
//!
//! The engine talks to storage exclusively through the traits in [`store`];
//! [`store::InMemoryStore`] backs dev and tests, [`store::PostgresStore`] is
//! the durable adapter.

pub mod store;

pub use store::{
    CustomerStore, InMemoryStore, InvoiceStore, PostgresStore, ServiceStore, StoreError,
};
