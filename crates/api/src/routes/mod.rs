//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET /healthz       - Liveness: {"ok": true, "app": "Kori"}
//! GET /readyz        - Readiness: {"ready": true}
//! GET /version       - {"version": APP_VERSION}
//! GET /openapi.json  - OpenAPI document, converted from YAML per request
//! ```
//!
//! Anything else is `404 {"error": "Not Found"}`, including known paths
//! requested with an unsupported method.

pub mod health;
pub mod openapi;

use axum::{Router, routing::get};

use crate::error::not_found;
use crate::state::AppState;

/// Build the route table (without middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .route("/openapi.json", get(openapi::openapi_json))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
}
