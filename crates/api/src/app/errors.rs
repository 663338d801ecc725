use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fatura_core::DomainError;
use fatura_engine::EngineError;
use fatura_infra::StoreError;

/// Map an engine failure onto the wire contract. Every rejected mutation
/// carries a caller-addressable code + message; nothing is swallowed.
pub fn engine_error_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Domain(domain) => match domain {
            DomainError::Validation(msg) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
            }
            DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            DomainError::ConstraintViolation(msg) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, "constraint_violation", msg)
            }
            DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        },
        EngineError::Store(store) => match store {
            StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            // Interactive mutations are not auto-retried; the caller is told to.
            err if err.is_transient() => json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "storage temporarily unavailable, retry the request",
            ),
            err => {
                tracing::error!(error = %err, "store failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "storage backend failure",
                )
            }
        },
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
