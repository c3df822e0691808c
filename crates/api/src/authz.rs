//! API-side authorization guard.
//!
//! Handlers check the route's permission before touching the audit services.
//! The approval gate performs its own check as well.

use axum::http::StatusCode;
use axum::response::Response;

use rodstock_auth::{Permission, authorize};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Require one permission for the current request.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), Response> {
    authorize(principal.principal(), permission)
        .map_err(|e| json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
