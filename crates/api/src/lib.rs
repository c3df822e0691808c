//! HTTP API: routing, identity headers, and request/response mapping for the
//! audit workflow.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
