//! API health probe.

use std::fmt;

/// Health of the API as seen by the web shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Ok,
    Down,
}

impl ApiStatus {
    /// Human-readable label shown on the status page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "API OK",
            Self::Down => "API DOWN",
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ask the API whether it is alive.
///
/// Issues exactly one `GET {api_base_url}/healthz`. The API is `Ok` only if
/// the body is JSON whose `ok` field is the boolean `true`; any network,
/// decoding or shape failure is `Down`. There is no retry.
pub async fn check_api_health(client: &reqwest::Client, api_base_url: &str) -> ApiStatus {
    let url = format!("{}/healthz", api_base_url.trim_end_matches('/'));

    let body = match client.get(&url).send().await {
        Ok(response) => response.json::<serde_json::Value>().await,
        Err(e) => Err(e),
    };

    match body {
        Ok(body) if body.get("ok") == Some(&serde_json::Value::Bool(true)) => ApiStatus::Ok,
        Ok(body) => {
            tracing::debug!(url = %url, body = %body, "API health response has no ok: true");
            ApiStatus::Down
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "API health check failed");
            ApiStatus::Down
        }
    }
}
