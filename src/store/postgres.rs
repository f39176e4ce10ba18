//! Postgres store backend.
//!
//! Vault entries live in their own table, so appends and removals are single
//! row statements — concurrent mutations on the same user cannot overwrite
//! each other. Insertion order is kept by an identity `seq` column.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, Connection, PgPool, Row};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use super::{NewUser, NewVaultEntry, StoreError, User, UserStore, VaultEntry};

const SCHEMA_SQL: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/db/sql/01_securepass.sql"
));

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database behind the DSN.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be established.
    pub async fn connect(dsn: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema. Statements are `IF NOT EXISTS`, safe to re-run.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to apply schema")?;
        Ok(())
    }

    async fn user_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let query = "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1) AS exists";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to check user existence"))?;
        Ok(row.get("exists"))
    }
}

fn backend(err: sqlx::Error, what: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err).context(what))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        totp_secret: row.get("totp_secret"),
        totp_enabled: row.get("totp_enabled"),
        created_at: row.get("created_at"),
    }
}

fn entry_from_row(row: &PgRow) -> VaultEntry {
    VaultEntry {
        id: row.get("id"),
        site: row.get("site"),
        username: row.get("entry_username"),
        secret_value: row.get("secret_value"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let query = r"
            INSERT INTO users
                (id, username, password_hash, totp_secret)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, totp_secret, totp_enabled, created_at
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .bind(&new_user.totp_secret)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(user_from_row(&row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(backend(err, "failed to insert user")),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = r"
            SELECT id, username, password_hash, totp_secret, totp_enabled, created_at
            FROM users WHERE username = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to lookup user by username"))?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = r"
            SELECT id, username, password_hash, totp_secret, totp_enabled, created_at
            FROM users WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to lookup user by id"))?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn enable_totp(&self, id: Uuid) -> Result<(), StoreError> {
        let query = "UPDATE users SET totp_enabled = TRUE WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to enable totp"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid) -> Result<Vec<VaultEntry>, StoreError> {
        if !self.user_exists(user_id).await? {
            return Err(StoreError::NotFound);
        }

        let query = r"
            SELECT id, site, entry_username, secret_value, created_at
            FROM vault_entries WHERE user_id = $1 ORDER BY seq
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to list vault entries"))?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn append_entry(
        &self,
        user_id: Uuid,
        entry: NewVaultEntry,
    ) -> Result<VaultEntry, StoreError> {
        let query = r"
            INSERT INTO vault_entries
                (id, user_id, site, entry_username, secret_value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, site, entry_username, secret_value, created_at
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&entry.site)
            .bind(&entry.username)
            .bind(&entry.secret_value)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(entry_from_row(&row)),
            Err(err) if is_foreign_key_violation(&err) => Err(StoreError::NotFound),
            Err(err) => Err(backend(err, "failed to insert vault entry")),
        }
    }

    async fn remove_entry(&self, user_id: Uuid, entry_id: Uuid) -> Result<(), StoreError> {
        if !self.user_exists(user_id).await? {
            return Err(StoreError::NotFound);
        }

        // Scoped to the owner; deleting an absent id is a no-op by contract.
        let query = "DELETE FROM vault_entries WHERE user_id = $1 AND id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(entry_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to delete vault entry"))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|err| backend(err, "failed to acquire database connection"))?;
        conn.ping()
            .await
            .map_err(|err| backend(err, "failed to ping database"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn foreign_key_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(is_foreign_key_violation(&err));
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn schema_creates_expected_tables() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS vault_entries"));
    }
}
