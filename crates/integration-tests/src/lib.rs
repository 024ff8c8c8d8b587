//! Integration tests for Kori.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests (no external services)
//! cargo test -p kori-integration-tests
//!
//! # Include the PostgreSQL seed tests
//! TEST_DATABASE_URL=postgres://localhost/kori_test \
//!     cargo test -p kori-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_http` - API and web shell over real TCP listeners
//! - `seed_postgres` - Seed runner against a real database (ignored by default)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use kori_api::BoundServer;
use kori_core::KoriConfig;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Variables every test configuration starts from.
const BASE_VARS: [(&str, &str); 6] = [
    ("HOST", "127.0.0.1"),
    ("DATABASE_URL", "postgres://localhost/kori_test"),
    ("ADMIN_PASSWORD", "Adm1n-Passw0rd"),
    ("ML_JWT_SECRET", "ml-7f3a9c2e1b"),
    ("ADMIN_JWT_SECRET", "adm-4d8b6e0f2a"),
    ("OPENAPI_PATH", concat!(env!("CARGO_MANIFEST_DIR"), "/../api/openapi.yaml")),
];

/// Build a valid configuration, applying `overrides` on top of the defaults.
///
/// # Panics
///
/// Panics if the resulting configuration is invalid.
#[must_use]
pub fn test_config(overrides: &[(&str, &str)]) -> KoriConfig {
    let vars = BASE_VARS
        .iter()
        .filter(|(k, _)| !overrides.iter().any(|(ok, _)| ok == k))
        .chain(overrides.iter())
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()));

    KoriConfig::from_source(vars).expect("test configuration is valid")
}

/// An API server running on an ephemeral port.
pub struct TestApi {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), kori_api::ServerError>>,
}

impl TestApi {
    /// Start the API with the given configuration overrides.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind a local port.
    pub async fn spawn(overrides: &[(&str, &str)]) -> Self {
        let mut config = test_config(overrides);
        config.port = 0;

        let server = BoundServer::bind(config)
            .await
            .expect("bind ephemeral port");
        let addr = server.local_addr().expect("bound address");

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Base URL such as `http://127.0.0.1:54321`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server and wait for it to drain.
    ///
    /// # Panics
    ///
    /// Panics if the server task failed.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle
            .await
            .expect("server task")
            .expect("server exits cleanly");
    }
}
