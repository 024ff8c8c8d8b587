//! Client record repository.

use sqlx::PgPool;

use super::{ClientStore, RepositoryError};

/// A client record to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewClient<'a> {
    pub id: &'a str,
    pub name: &'a str,
    /// Stored in the `type` column.
    pub kind: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

/// Repository for `client` rows.
pub struct ClientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientRepository<'a> {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ClientStore for ClientRepository<'_> {
    async fn insert_if_absent(&self, client: &NewClient<'_>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO client (id, name, "type", email, phone)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(client.id)
        .bind(client.name)
        .bind(client.kind)
        .bind(client.email)
        .bind(client.phone)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
