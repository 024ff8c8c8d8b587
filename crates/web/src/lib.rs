//! Kori Web - status page for the Kori API.
//!
//! Serves a single page at `/` that checks the API's `/healthz` once per
//! view and shows the result.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod health;

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use kori_core::APP_NAME;

pub use config::WebConfig;
pub use health::{ApiStatus, check_api_health};

/// Upper bound on one health probe, so a hung API cannot hang the page.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state: the HTTP client and where the API lives.
#[derive(Clone)]
pub struct WebState {
    inner: Arc<WebStateInner>,
}

struct WebStateInner {
    client: reqwest::Client,
    api_base_url: String,
}

impl WebState {
    /// Create state for an API at `api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(HEALTH_CHECK_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(WebStateInner {
                client,
                api_base_url: api_base_url.into(),
            }),
        })
    }
}

/// Status page template.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    app: &'a str,
    status: &'a str,
    healthy: bool,
    api_base_url: &'a str,
}

/// Build the web shell router.
pub fn app(state: WebState) -> Router {
    Router::new().route("/", get(index)).with_state(state)
}

/// Render the status page.
///
/// GET /
async fn index(State(state): State<WebState>) -> impl IntoResponse {
    let status = check_api_health(&state.inner.client, &state.inner.api_base_url).await;

    Html(
        IndexTemplate {
            app: APP_NAME,
            status: status.label(),
            healthy: status == ApiStatus::Ok,
            api_base_url: &state.inner.api_base_url,
        }
        .render()
        .unwrap_or_else(|_| format!("{APP_NAME} backend status: {status}")),
    )
}
