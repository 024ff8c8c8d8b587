//! Database operations for the seed runner.
//!
//! ## Tables
//!
//! - `admin_user` - Administrator accounts (unique email, Argon2id hash)
//! - `client` - Client records
//!
//! Both tables are owned by the application schema; the CLI only reads and
//! writes rows and never creates or migrates them.
//!
//! The seed logic talks to storage through [`AdminAccountStore`] and
//! [`ClientStore`], implemented here over `PgPool`.

pub mod admin_users;
pub mod clients;

use std::future::Future;
use std::time::Duration;

use kori_core::{AdminUserId, Email};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::{AdminAccount, AdminUserRepository};
pub use clients::{ClientRepository, NewClient};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for administrator accounts.
pub trait AdminAccountStore {
    /// Look up the account with exactly this email.
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<AdminAccount>, RepositoryError>> + Send;

    /// Replace the stored password hash of an existing account.
    fn update_password_hash(
        &self,
        id: AdminUserId,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a new account.
    fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> impl Future<Output = Result<AdminAccount, RepositoryError>> + Send;
}

/// Storage for client records.
pub trait ClientStore {
    /// Insert `client` unless a record with its id exists.
    ///
    /// Returns `true` if a row was inserted.
    fn insert_if_absent(
        &self,
        client: &NewClient<'_>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Create a small `PostgreSQL` connection pool for one-shot commands.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
