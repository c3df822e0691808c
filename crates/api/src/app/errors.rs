use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rodstock_audit::AuditError;

pub fn audit_error_to_response(err: AuditError) -> axum::response::Response {
    match err {
        AuditError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuditError::Authorization(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        AuditError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        e @ AuditError::AlreadyApplied(_) => {
            json_error(StatusCode::CONFLICT, "already_applied", e.to_string())
        }
        e @ AuditError::Cancelled => json_error(StatusCode::CONFLICT, "cancelled", e.to_string()),
        AuditError::Persistence(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
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
