use axum::http::StatusCode;
use axum::response::Response;

use fatura_auth::roles;

use crate::app::errors;
use crate::context::ActorContext;

/// Batch operations (renewal run, overdue sweep) are administratively gated.
pub fn require_admin(actor: &ActorContext) -> Result<(), Response> {
    if actor.has_role(&roles::ADMIN) {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "this operation requires the admin role",
        ))
    }
}
