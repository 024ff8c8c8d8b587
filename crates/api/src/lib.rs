//! Kori API - HTTP API skeleton.
//!
//! This library backs the `kori-api` binary, which serves on port 4000 by
//! default.
//!
//! # Architecture
//!
//! - Axum web framework with a fixed middleware stack
//! - Liveness, readiness, version and `OpenAPI` endpoints
//! - Uniform JSON error bodies for handler errors, panics and unknown routes
//!
//! The library is split from the binary so integration tests can build the
//! exact router the binary serves.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::AppError;
pub use server::{BoundServer, ServerError, ServerPhase, build_app};
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support {
    use kori_core::KoriConfig;

    /// A valid configuration with the given overrides applied.
    #[allow(clippy::unwrap_used)]
    pub fn config(overrides: &[(&str, &str)]) -> KoriConfig {
        let mut vars: Vec<(String, String)> = [
            ("DATABASE_URL", "postgres://localhost/kori_test"),
            ("ADMIN_PASSWORD", "Adm1n-Passw0rd"),
            ("ML_JWT_SECRET", "ml-7f3a9c2e1b"),
            ("ADMIN_JWT_SECRET", "adm-4d8b6e0f2a"),
            ("APP_VERSION", "1.2.3-test"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        vars.retain(|(k, _)| !overrides.iter().any(|(ok, _)| *ok == k.as_str()));
        vars.extend(overrides.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
        KoriConfig::from_source(vars).unwrap()
    }
}
