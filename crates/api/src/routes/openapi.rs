//! `OpenAPI` document endpoint.
//!
//! The YAML source is re-read on every request so edits show up without a
//! restart.

use std::path::Path;

use axum::{Json, extract::State};

use crate::error::{OpenApiError, Result};
use crate::state::AppState;

/// Serve the `OpenAPI` YAML document as JSON.
///
/// # Errors
///
/// Returns a 500 if the file is missing, is not YAML, or has no JSON form.
pub async fn openapi_json(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let document = load_document(&state.config().openapi_path).await?;
    Ok(Json(document))
}

/// Read and convert a YAML document.
///
/// Parsing goes through `serde_yaml::Value` so non-string mapping keys, such
/// as the numeric status codes under `responses`, become JSON strings.
///
/// # Errors
///
/// Returns an [`OpenApiError`] naming the file and the failing step.
pub async fn load_document(path: &Path) -> std::result::Result<serde_json::Value, OpenApiError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| OpenApiError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&raw).map_err(|source| OpenApiError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::to_value(yaml).map_err(|source| OpenApiError::Convert {
        path: path.to_path_buf(),
        source,
    })
}
