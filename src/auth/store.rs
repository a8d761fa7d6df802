//! Account lookup.

use super::request::Role;
use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, Connection, PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info_span, Instrument};

// uid is read as text so integer and textual keys both decode. A NULL label
// comes back as "" and a NULL is_blocked as false.
const FIND_ACCOUNT_SQL: &str = r"
    SELECT
        uid::text AS uid,
        email,
        password,
        role,
        COALESCE(label, '') AS label,
        COALESCE(is_blocked, false) AS is_blocked
    FROM users
    WHERE email = $1 AND role = $2
    LIMIT 1
";

/// A row of the `users` table. Read-only from this service.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub uid: String,
    pub email: String,
    pub password: SecretString,
    pub role: String,
    pub label: String,
    pub is_blocked: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to acquire database connection: {0}")]
    Unavailable(#[source] sqlx::Error),
    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find the account matching `email` and `role` exactly. When the store
    /// holds duplicates the first match is returned.
    async fn find_account(
        &self,
        email: &str,
        role: &Role,
    ) -> Result<Option<AccountRecord>, StoreError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres backed store.
///
/// Every lookup borrows one pooled connection, which goes back to the pool
/// when the lookup returns, on every path.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgAccountStore {
    #[must_use]
    pub const fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Build a pool that opens connections on first use, so the service can
    /// start while the database is down.
    ///
    /// # Errors
    /// Returns an error if the connection string cannot be parsed.
    pub fn connect_lazy(
        dsn: &str,
        max_connections: u32,
        query_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(max_connections)
            .acquire_timeout(query_timeout)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect_lazy(dsn)?;

        Ok(Self::new(pool, query_timeout))
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lookup(&self, email: &str, role: &Role) -> Result<Option<AccountRecord>, StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(StoreError::Unavailable)?;

        let query_span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.sql.table = "users"
        );
        let row = sqlx::query(FIND_ACCOUNT_SQL)
            .bind(email)
            .bind(role.as_str())
            .fetch_optional(&mut *conn)
            .instrument(query_span)
            .await
            .map_err(StoreError::Query)?;

        row.as_ref().map(record_from_row).transpose()
    }
}

fn record_from_row(row: &PgRow) -> Result<AccountRecord, StoreError> {
    Ok(AccountRecord {
        uid: row.try_get("uid").map_err(StoreError::Query)?,
        email: row.try_get("email").map_err(StoreError::Query)?,
        password: SecretString::from(
            row.try_get::<String, _>("password")
                .map_err(StoreError::Query)?,
        ),
        role: row.try_get("role").map_err(StoreError::Query)?,
        label: row.try_get("label").map_err(StoreError::Query)?,
        is_blocked: row.try_get("is_blocked").map_err(StoreError::Query)?,
    })
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_account(
        &self,
        email: &str,
        role: &Role,
    ) -> Result<Option<AccountRecord>, StoreError> {
        timeout(self.query_timeout, self.lookup(email, role))
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout))?
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let ping = async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(StoreError::Unavailable)?;
            conn.ping().await.map_err(StoreError::Query)
        }
        .instrument(info_span!(
            "db.ping",
            db.system = "postgresql",
            db.operation = "PING"
        ));

        timeout(self.query_timeout, ping)
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout))?
    }
}

/// In-process store holding a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    records: Vec<AccountRecord>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new(records: Vec<AccountRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn with_record(mut self, record: AccountRecord) -> Self {
        self.records.push(record);
        self
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_account(
        &self,
        email: &str,
        role: &Role,
    ) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|record| record.email == email && record.role == role.as_str())
            .cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
