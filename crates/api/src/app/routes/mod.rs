use axum::{routing::get, Router};

pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod services;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/customers", customers::router())
        .nest("/services", services::router())
        .nest("/invoices", invoices::router())
        .nest("/dashboard", dashboard::router())
}
