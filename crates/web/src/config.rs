//! Web shell configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `API_BASE_URL` - Base URL of the Kori API (default: `http://localhost:4000`)
//! - `WEB_HOST` - Bind address (default: 127.0.0.1)
//! - `WEB_PORT` - Listen port (default: 5173)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 5173;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Web shell configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// Base URL of the API, without trailing slash
    pub api_base_url: String,
    /// IP address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl WebConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_source(kori_core::utf8_vars(std::env::vars_os()))
    }

    /// Build configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_source<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let api_base_url = match vars.get("API_BASE_URL") {
            Some(raw) => {
                Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                    key: "API_BASE_URL",
                    message: e.to_string(),
                })?;
                raw.trim_end_matches('/').to_owned()
            }
            None => DEFAULT_API_BASE_URL.to_owned(),
        };

        let host = match vars.get("WEB_HOST") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "WEB_HOST",
                message: format!("must be an IP address (got '{raw}')"),
            })?,
            None => DEFAULT_HOST,
        };

        let port = match vars.get("WEB_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "WEB_PORT",
                        message: format!("must be an integer between 1 and 65535 (got '{raw}')"),
                    });
                }
            },
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_base_url,
            host,
            port,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebConfig::from_source(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:4000");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5173");
    }

    #[test]
    fn test_trailing_slash_removed() {
        let config =
            WebConfig::from_source([("API_BASE_URL", "https://api.kori.test/")]).unwrap();
        assert_eq!(config.api_base_url, "https://api.kori.test");
    }

    #[test]
    fn test_invalid_values() {
        let err = WebConfig::from_source([("API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "API_BASE_URL", .. }));

        let err = WebConfig::from_source([("WEB_PORT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "WEB_PORT", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variables_are_skipped() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let vars = [
            (OsString::from_vec(vec![0xff]), OsString::from("x")),
            (OsString::from("API_BASE_URL"), OsString::from_vec(vec![0x80])),
            (OsString::from("WEB_PORT"), OsString::from("8080")),
        ];

        let config = WebConfig::from_source(kori_core::utf8_vars(vars)).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:4000");
        assert_eq!(config.port, 8080);
    }
}
