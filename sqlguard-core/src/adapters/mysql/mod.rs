//! MySQL introspection collaborator.
//!
//! # Module Structure
//! - `connection`: URL parsing, validation and pool setup
//! - `introspection`: table and column declaration queries
//!
//! # Security Guarantees
//! - Sessions are switched to read-only before any query runs
//! - Every statement is bounded by `max_execution_time`
//! - The connection URL is zeroized on drop and redacted in errors

pub mod connection;
pub mod introspection;


use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SqlGuardError;
use crate::models::RawSchema;
use sqlx::MySqlPool;
use zeroize::Zeroizing;

pub use connection::{parse_mysql_connection_config, validate_mysql_connection_string};

/// MySQL adapter bound to one database.
pub struct MySqlAdapter {
    /// Connection pool for introspection queries
    pub pool: MySqlPool,
    /// Connection configuration (timeouts, pool size, database)
    pub config: ConnectionConfig,
    /// Kept private to prevent credential exposure
    connection_url: Zeroizing<String>,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl MySqlAdapter {
    /// Database whose schema this adapter reads.
    pub fn database(&self) -> &str {
        // the constructor refuses URLs without a database
        self.config.database.as_deref().unwrap_or_default()
    }

    /// Connection URL with the password masked.
    pub fn redacted_url(&self) -> String {
        crate::error::redact_database_url(&self.connection_url)
    }

    /// Checks connectivity and access to `INFORMATION_SCHEMA`.
    ///
    /// # Errors
    /// Returns a connection error when the server is unreachable, or a
    /// collection error when the metadata tables cannot be read.
    pub async fn test_connection(&self) -> Result<()> {
        let connectivity: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(SqlGuardError::connection_failed)?;

        if connectivity != 1 {
            return Err(SqlGuardError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        let visible: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?",
        )
        .bind(self.database())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SqlGuardError::collection_failed("Cannot access INFORMATION_SCHEMA", e))?;

        if visible == 0 {
            return Err(SqlGuardError::configuration(format!(
                "Database '{}' does not exist or is not visible to this user",
                self.database()
            )));
        }

        Ok(())
    }

    /// Reads the table -> column -> declaration mapping of the database.
    ///
    /// # Errors
    /// Returns a collection error if the metadata query fails.
    pub async fn fetch_raw_schema(&self) -> Result<RawSchema> {
        introspection::fetch_raw_schema(&self.pool, self.database()).await
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
