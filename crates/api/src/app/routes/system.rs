use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::ActorContext;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn whoami(Extension(actor): Extension<ActorContext>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "principalId": actor.principal_id().to_string(),
            "roles": actor.roles(),
        })),
    )
        .into_response()
}
