use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use fatura_billing::InvoiceDraft;
use fatura_core::{InvoiceId, ServiceId};
use fatura_engine::{InvoiceView, PageRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        // Update carries the id in the body, matching the consuming client.
        .route("/", get(list_invoices).post(create_invoice).put(update_invoice))
        .route("/upcoming", get(upcoming))
        .route("/overdue", get(overdue))
        .route("/search", get(search))
        .route("/service-price/:service_id", get(service_price))
        .route("/update-overdue", post(update_overdue))
        .route("/process-renewals", post(process_renewals))
        .route("/:id", get(get_invoice).delete(delete_invoice))
        .route("/:id/mark-paid", put(mark_paid))
        .route("/:id/cancel", put(cancel))
}

fn parse_id(id: &str) -> Result<InvoiceId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id")
    })
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.invoices.list(Utc::now().date_naive()).await {
        Ok(views) => (StatusCode::OK, Json(dto::ListResponse::new(views))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(draft): Json<InvoiceDraft>,
) -> axum::response::Response {
    let today = Utc::now().date_naive();
    match services.invoices.create(draft, Utc::now()).await {
        Ok(invoice) => {
            (StatusCode::CREATED, Json(InvoiceView::of(&invoice, today))).into_response()
        }
        Err(e) => errors::engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub id: InvoiceId,
    #[serde(flatten)]
    pub draft: InvoiceDraft,
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> axum::response::Response {
    let today = Utc::now().date_naive();
    match services.invoices.update(request.id, request.draft).await {
        Ok(invoice) => (StatusCode::OK, Json(InvoiceView::of(&invoice, today))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.invoices.get(id, Utc::now().date_naive()).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.invoices.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn mark_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let today = Utc::now().date_naive();
    match services.invoices.mark_paid(id).await {
        Ok(invoice) => (StatusCode::OK, Json(InvoiceView::of(&invoice, today))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let today = Utc::now().date_naive();
    match services.invoices.cancel(id).await {
        Ok(invoice) => (StatusCode::OK, Json(InvoiceView::of(&invoice, today))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn upcoming(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.invoices.upcoming(Utc::now().date_naive()).await {
        Ok(views) => (StatusCode::OK, Json(dto::ListResponse::new(views))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn overdue(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.invoices.overdue(Utc::now().date_naive()).await {
        Ok(views) => (StatusCode::OK, Json(dto::ListResponse::new(views))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn service_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(service_id): Path<String>,
) -> axum::response::Response {
    let service_id: ServiceId = match service_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid service id")
        }
    };
    match services.catalog.price_of(service_id).await {
        Ok(price) => (
            StatusCode::OK,
            Json(serde_json::json!({ "serviceId": service_id, "price": price })),
        )
            .into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub customer_name: Option<String>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<SearchParams>,
) -> axum::response::Response {
    let defaults = PageRequest::default();
    let request = PageRequest {
        page_number: params.page_number.unwrap_or(defaults.page_number),
        page_size: params.page_size.unwrap_or(defaults.page_size),
    };
    let query = params.customer_name.unwrap_or_default();

    match services
        .search
        .by_customer_name(&query, request, Utc::now().date_naive())
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

/// Persist the Pending→Overdue flips (admin only).
pub async fn update_overdue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(response) = authz::require_admin(&actor) {
        return response;
    }
    match services.overdue.run(Utc::now().date_naive()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

/// Run the renewal batch (admin only). Returns the per-invoice outcome list.
pub async fn process_renewals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(response) = authz::require_admin(&actor) {
        return response;
    }
    match services
        .renewals
        .run(Utc::now().date_naive(), Utc::now())
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}
