//! Seed the administrator account and a sample client.
//!
//! # Usage
//!
//! ```bash
//! ADMIN_EMAIL=admin@kori.test ADMIN_PASSWORD='Str0ng-Passw0rd' kori seed
//! ```
//!
//! Re-running is safe: the administrator's password hash is replaced with a
//! fresh one and the sample client is left untouched once it exists. The two
//! steps are independent; no transaction spans them.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use kori_core::password::is_strong_password;
use kori_core::{Email, EmailError, KoriConfig};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::db::{
    self, AdminAccountStore, AdminUserRepository, ClientRepository, ClientStore, NewClient,
    RepositoryError,
};

/// The sample client inserted on first run.
pub const SAMPLE_CLIENT: NewClient<'static> = NewClient {
    id: "seed-sample-client",
    name: "Sample Client",
    kind: "company",
    email: "sample-client@example.test",
    phone: "+0 0000 000000",
};

/// Errors that stop the seed runner.
#[derive(Debug, Error)]
pub enum SeedError {
    /// `ADMIN_EMAIL` or `ADMIN_PASSWORD` is unset or blank.
    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must both be set to seed an administrator")]
    MissingCredentials,

    /// `ADMIN_EMAIL` is not a usable address.
    #[error("ADMIN_EMAIL is invalid: {0}")]
    InvalidEmail(#[from] EmailError),

    /// `ADMIN_PASSWORD` fails the strength rules.
    #[error(
        "ADMIN_PASSWORD is too weak: use at least 10 characters mixing at least 3 of lowercase, uppercase, digits and symbols"
    )]
    WeakPassword,

    /// Argon2 could not hash the password.
    #[error("failed to hash password")]
    PasswordHash,

    /// The administrator could not be read or written.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// The database could not be reached.
    #[error("database connection error: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Result of [`ensure_administrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeedOutcome {
    /// `true` if a new account was inserted, `false` if an existing one was
    /// given a new password hash.
    pub created: bool,
    pub email: Email,
}

/// Result of [`ensure_sample_client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleClientOutcome {
    Created,
    AlreadyPresent,
    /// The store failed; the reason is reported and the run continues.
    Skipped(String),
}

/// Everything one seed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub admin: AdminSeedOutcome,
    pub sample_client: SampleClientOutcome,
}

/// Validated administrator credentials, trimmed.
struct AdminCredentials<'a> {
    email: Email,
    password: &'a str,
}

/// Read and validate the administrator credentials without touching storage.
fn admin_credentials(config: &KoriConfig) -> Result<AdminCredentials<'_>, SeedError> {
    let email = config
        .admin_email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let password = Some(config.admin_password.expose_secret().trim()).filter(|s| !s.is_empty());

    let (Some(email), Some(password)) = (email, password) else {
        return Err(SeedError::MissingCredentials);
    };

    let email = Email::parse(email)?;
    if !is_strong_password(password) {
        return Err(SeedError::WeakPassword);
    }

    Ok(AdminCredentials { email, password })
}

/// Hash a password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, SeedError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| SeedError::PasswordHash)
}

/// Create the administrator account, or reset its password if it exists.
///
/// The password is hashed on every run, so re-running with a new
/// `ADMIN_PASSWORD` rotates the stored hash.
///
/// # Errors
///
/// Returns `MissingCredentials`, `InvalidEmail` or `WeakPassword` before any
/// storage access, and `Repository` if the store fails.
pub async fn ensure_administrator<S>(
    config: &KoriConfig,
    store: &S,
) -> Result<AdminSeedOutcome, SeedError>
where
    S: AdminAccountStore + Sync,
{
    let AdminCredentials { email, password } = admin_credentials(config)?;

    let existing = store.find_by_email(&email).await?;
    let password_hash = hash_password(password)?;

    let created = if let Some(account) = existing {
        store.update_password_hash(account.id, &password_hash).await?;
        tracing::info!(email = %email, id = %account.id, "Updated administrator password");
        false
    } else {
        let account = store.create(&email, &password_hash).await?;
        tracing::info!(email = %email, id = %account.id, "Created administrator");
        true
    };

    Ok(AdminSeedOutcome { created, email })
}

/// Insert the sample client if it does not exist yet.
///
/// Never fails: storage errors are logged and reported as
/// [`SampleClientOutcome::Skipped`].
pub async fn ensure_sample_client<S>(store: &S) -> SampleClientOutcome
where
    S: ClientStore + Sync,
{
    match store.insert_if_absent(&SAMPLE_CLIENT).await {
        Ok(true) => {
            tracing::info!(id = SAMPLE_CLIENT.id, "Created sample client");
            SampleClientOutcome::Created
        }
        Ok(false) => {
            tracing::info!(id = SAMPLE_CLIENT.id, "Sample client already present");
            SampleClientOutcome::AlreadyPresent
        }
        Err(e) => {
            tracing::warn!(id = SAMPLE_CLIENT.id, error = %e, "Skipping sample client");
            SampleClientOutcome::Skipped(e.to_string())
        }
    }
}

/// Run both seed steps against the given stores.
///
/// The administrator comes first. If it fails, the sample client is not
/// written.
///
/// # Errors
///
/// Returns the administrator step's error.
pub async fn seed_with<A, C>(
    config: &KoriConfig,
    admins: &A,
    clients: &C,
) -> Result<SeedReport, SeedError>
where
    A: AdminAccountStore + Sync,
    C: ClientStore + Sync,
{
    let admin = ensure_administrator(config, admins).await?;
    let sample_client = ensure_sample_client(clients).await;

    tracing::info!(
        email = %admin.email,
        created = admin.created,
        sample_client = ?sample_client,
        "Seeding complete"
    );

    Ok(SeedReport {
        admin,
        sample_client,
    })
}

/// Run both seed steps against the configured database.
///
/// # Errors
///
/// Returns an error if the credentials are invalid, the database cannot be
/// reached, or the administrator cannot be written.
pub async fn run(config: &KoriConfig) -> Result<SeedReport, SeedError> {
    // Fail on bad credentials before opening any connection
    admin_credentials(config)?;

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    let report = seed_with(
        config,
        &AdminUserRepository::new(&pool),
        &ClientRepository::new(&pool),
    )
    .await;

    pool.close().await;
    report
}
