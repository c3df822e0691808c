//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and audit service wiring, per-operator draft registry
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and path parsing
//! - `errors.rs`: consistent error responses

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    // Audit routes: require an asserted operator identity.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
