use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use fatura_core::{CustomerId, ServiceId};
use fatura_customers::CustomerDraft;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/service-analysis", get(service_analysis))
        .route("/service-usage-by-customer", get(usage_by_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/service-usage", get(customer_usage))
}

fn parse_id(id: &str) -> Result<CustomerId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id")
    })
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.customers.list().await {
        Ok(customers) => (StatusCode::OK, Json(dto::ListResponse::new(customers))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(draft): Json<CustomerDraft>,
) -> axum::response::Response {
    match services.customers.create(draft, Utc::now()).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.customers.get(id).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(draft): Json<CustomerDraft>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.customers.update(id, draft, Utc::now()).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.customers.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn service_analysis(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.analytics.service_analysis().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn customer_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.analytics.customer_usage(id).await {
        Ok(usage) => (StatusCode::OK, Json(usage)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageParams {
    pub service_id: Option<String>,
}

pub async fn usage_by_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<UsageParams>,
) -> axum::response::Response {
    let service_id = match params.service_id.as_deref() {
        Some(raw) => match raw.parse::<ServiceId>() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid service id",
                )
            }
        },
        None => None,
    };
    match services.analytics.usage_by_customer(service_id).await {
        Ok(usages) => (StatusCode::OK, Json(dto::ListResponse::new(usages))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}
