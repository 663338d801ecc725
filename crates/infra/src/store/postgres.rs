//! Postgres entity store.
//!
//! Customers and services map to plain columns; an invoice travels as one
//! JSONB document (it owns its line items, and the stored total must always
//! match the stored items — a single-column write keeps that atomic) with a
//! few extracted columns for indexed filtering.

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use fatura_billing::Invoice;
use fatura_catalog::Service;
use fatura_core::{CustomerId, InvoiceId, ServiceId};
use fatura_customers::Customer;

use super::{CustomerStore, InvoiceStore, ServiceStore, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{operation}: unique constraint violated"))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("{operation}: {err}")),
    }
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let read = |e: sqlx::Error| StoreError::Corrupt(format!("customer row: {e}"));
    Ok(Customer::from_stored(
        CustomerId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        row.try_get("first_name").map_err(read)?,
        row.try_get("last_name").map_err(read)?,
        row.try_get("email").map_err(read)?,
        row.try_get("phone").map_err(read)?,
        row.try_get("tax_office").map_err(read)?,
        row.try_get("tax_number").map_err(read)?,
        row.try_get("address").map_err(read)?,
        row.try_get("description").map_err(read)?,
        row.try_get("created_at").map_err(read)?,
        row.try_get("updated_at").map_err(read)?,
    ))
}

fn service_from_row(row: &PgRow) -> Result<Service, StoreError> {
    let read = |e: sqlx::Error| StoreError::Corrupt(format!("service row: {e}"));
    Ok(Service::from_stored(
        ServiceId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        row.try_get("name").map_err(read)?,
        row.try_get::<Decimal, _>("price").map_err(read)?,
        row.try_get("created_at").map_err(read)?,
        row.try_get("updated_at").map_err(read)?,
    ))
}

fn invoice_from_row(row: &PgRow) -> Result<Invoice, StoreError> {
    let payload: serde_json::Value = row
        .try_get("payload")
        .map_err(|e| StoreError::Corrupt(format!("invoice row: {e}")))?;
    serde_json::from_value(payload)
        .map_err(|e| StoreError::Corrupt(format!("invoice payload: {e}")))
}

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone, tax_office, tax_number, \
                                address, description, created_at, updated_at";

#[async_trait::async_trait]
impl CustomerStore for PostgresStore {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, first_name, last_name, email, phone, tax_office, tax_number,
                address, description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(customer.id_typed().as_uuid())
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email())
        .bind(customer.phone())
        .bind(customer.tax_office())
        .bind(customer.tax_number())
        .bind(customer.address())
        .bind(customer.description())
        .bind(customer.created_at())
        .bind(customer.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers.insert", e))?;
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE customers SET
                first_name = $2, last_name = $3, email = $4, phone = $5,
                tax_office = $6, tax_number = $7, address = $8, description = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(customer.id_typed().as_uuid())
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email())
        .bind(customer.phone())
        .bind(customer.tax_office())
        .bind(customer.tax_number())
        .bind(customer.address())
        .bind(customer.description())
        .bind(customer.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers.update", e))?;
        Ok(())
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("customers.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers.get", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers.list", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers.find_by_email", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl ServiceStore for PostgresStore {
    async fn insert(&self, service: &Service) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO services (id, name, price, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(service.id_typed().as_uuid())
        .bind(service.name())
        .bind(service.price())
        .bind(service.created_at())
        .bind(service.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("services.insert", e))?;
        Ok(())
    }

    async fn update(&self, service: &Service) -> Result<(), StoreError> {
        sqlx::query("UPDATE services SET name = $2, price = $3, updated_at = $4 WHERE id = $1")
            .bind(service.id_typed().as_uuid())
            .bind(service.name())
            .bind(service.price())
            .bind(service.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("services.update", e))?;
        Ok(())
    }

    async fn delete(&self, id: ServiceId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("services.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: ServiceId) -> Result<Option<Service>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, price, created_at, updated_at FROM services WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("services.get", e))?;
        row.as_ref().map(service_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Service>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, price, created_at, updated_at FROM services ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("services.list", e))?;
        rows.iter().map(service_from_row).collect()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Service>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, price, created_at, updated_at FROM services \
             WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("services.find_by_name", e))?;
        row.as_ref().map(service_from_row).transpose()
    }
}

#[async_trait::async_trait]
impl InvoiceStore for PostgresStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let payload = serde_json::to_value(invoice)
            .map_err(|e| StoreError::Backend(format!("invoices.insert: encode: {e}")))?;
        sqlx::query(
            "INSERT INTO invoices (id, customer_id, status, is_renewal, renewed_from, created_at, payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invoice.id_typed().as_uuid())
        .bind(invoice.customer_id().as_uuid())
        .bind(invoice.status().as_str())
        .bind(invoice.is_renewal())
        .bind(invoice.renewed_from().map(|id| *id.as_uuid()))
        .bind(invoice.created_at())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invoices.insert", e))?;
        Ok(())
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let payload = serde_json::to_value(invoice)
            .map_err(|e| StoreError::Backend(format!("invoices.update: encode: {e}")))?;
        sqlx::query(
            "UPDATE invoices SET customer_id = $2, status = $3, is_renewal = $4, \
             renewed_from = $5, payload = $6 WHERE id = $1",
        )
        .bind(invoice.id_typed().as_uuid())
        .bind(invoice.customer_id().as_uuid())
        .bind(invoice.status().as_str())
        .bind(invoice.is_renewal())
        .bind(invoice.renewed_from().map(|id| *id.as_uuid()))
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invoices.update", e))?;
        Ok(())
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query("SELECT payload FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices.get", e))?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query("SELECT payload FROM invoices ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices.list", e))?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM invoices WHERE customer_id = $1 ORDER BY created_at ASC",
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invoices.list_by_customer", e))?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn find_renewals_of(&self, source: InvoiceId) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query("SELECT payload FROM invoices WHERE renewed_from = $1")
            .bind(source.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices.find_renewals_of", e))?;
        rows.iter().map(invoice_from_row).collect()
    }
}
