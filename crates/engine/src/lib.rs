//! `fatura-engine` — the billing engine behind the HTTP boundary.
//!
//! Application services that combine the pure domain crates with the entity
//! store: the cross-entity validation rules, invoice operations, the renewal
//! batch processor, the overdue recomputation sweep, invoice search, and the
//! reporting queries. Every mutation validates first, writes second; every
//! read passes stored invoices through the status resolver.

pub mod analytics;
pub mod catalog;
pub mod customers;
pub mod error;
pub mod invoices;
pub mod overdue;
pub mod renewals;
pub mod retry;
pub mod rules;
pub mod search;
pub mod views;

pub use analytics::Analytics;
pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use error::{EngineError, EngineResult};
pub use invoices::InvoiceService;
pub use overdue::{OverdueReport, OverdueSweep};
pub use renewals::{RenewalProcessor, RenewalReport};
pub use search::{InvoiceSearch, Page, PageRequest};
pub use views::InvoiceView;
