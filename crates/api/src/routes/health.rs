//! Liveness, readiness and version endpoints.

use axum::{Json, extract::State};
use kori_core::APP_NAME;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
    pub app: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
}

#[derive(Debug, Serialize)]
pub struct Version {
    pub version: String,
}

/// Liveness check. Does not check dependencies.
pub async fn healthz() -> Json<Health> {
    Json(Health {
        ok: true,
        app: APP_NAME,
    })
}

/// Readiness check.
///
/// The API holds no connections yet, so it is ready as soon as it listens.
pub async fn readyz() -> Json<Readiness> {
    Json(Readiness { ready: true })
}

/// Report the configured application version.
pub async fn version(State(state): State<AppState>) -> Json<Version> {
    Json(Version {
        version: state.config().app_version.clone(),
    })
}
