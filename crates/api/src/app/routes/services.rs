use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use fatura_catalog::ServiceDraft;
use fatura_core::ServiceId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        // Update carries the id in the body, matching the consuming client.
        .route("/", get(list_services).post(create_service).put(update_service))
        .route("/:id", get(get_service).delete(delete_service))
}

fn parse_id(id: &str) -> Result<ServiceId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid service id")
    })
}

pub async fn list_services(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list().await {
        Ok(all) => (StatusCode::OK, Json(dto::ListResponse::new(all))).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn create_service(
    Extension(services): Extension<Arc<AppServices>>,
    Json(draft): Json<ServiceDraft>,
) -> axum::response::Response {
    match services.catalog.create(draft, Utc::now()).await {
        Ok(service) => (StatusCode::CREATED, Json(service)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub id: ServiceId,
    #[serde(flatten)]
    pub draft: ServiceDraft,
}

pub async fn update_service(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<UpdateServiceRequest>,
) -> axum::response::Response {
    match services
        .catalog
        .update(request.id, request.draft, Utc::now())
        .await
    {
        Ok(service) => (StatusCode::OK, Json(service)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn get_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.catalog.get(id).await {
        Ok(service) => (StatusCode::OK, Json(service)).into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}

pub async fn delete_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.catalog.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_response(e),
    }
}
