use std::sync::Arc;

use fatura_engine::{
    Analytics, CatalogService, CustomerService, InvoiceSearch, InvoiceService, OverdueSweep,
    RenewalProcessor,
};
use fatura_infra::{CustomerStore, InMemoryStore, InvoiceStore, PostgresStore, ServiceStore};

/// Engine services behind the routes, wired over one entity store.
#[derive(Clone)]
pub struct AppServices {
    pub customers: CustomerService,
    pub catalog: CatalogService,
    pub invoices: InvoiceService,
    pub renewals: RenewalProcessor,
    pub overdue: OverdueSweep,
    pub search: InvoiceSearch,
    pub analytics: Analytics,
}

impl AppServices {
    fn wire(
        customers: Arc<dyn CustomerStore>,
        services: Arc<dyn ServiceStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            customers: CustomerService::new(customers.clone(), invoices.clone()),
            catalog: CatalogService::new(services.clone()),
            invoices: InvoiceService::new(invoices.clone(), customers.clone(), services.clone()),
            renewals: RenewalProcessor::new(invoices.clone(), customers.clone(), services.clone()),
            overdue: OverdueSweep::new(invoices.clone()),
            search: InvoiceSearch::new(invoices.clone(), customers.clone()),
            analytics: Analytics::new(customers, services, invoices),
        }
    }
}

/// Select the storage backend from the environment.
///
/// `USE_PERSISTENT_STORES=true` wires Postgres (requires `DATABASE_URL`);
/// anything else runs on the in-memory store (dev/test).
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let pool = sqlx::PgPool::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");
        let store = Arc::new(PostgresStore::new(pool));
        store.migrate().await.expect("failed to run migrations");
        tracing::info!("using Postgres entity store");
        AppServices::wire(store.clone(), store.clone(), store)
    } else {
        tracing::info!("using in-memory entity store");
        let store = Arc::new(InMemoryStore::new());
        AppServices::wire(store.clone(), store.clone(), store)
    }
}
