//! Introspection connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port MySQL listens on when the URL names none.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Configuration for the schema introspection connection.
///
/// # Security
/// This struct does NOT store passwords. The password only lives in the
/// connection URL held by the adapter.
///
/// # Example
/// ```rust
/// use sqlguard_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("db.internal".to_string())
///     .with_port(3307)
///     .with_database("shop".to_string())
///     .with_username("reader".to_string());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "mysql://db.internal:3307/shop");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Database whose schema is introspected
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Per-statement timeout applied to the session
    pub query_timeout: Duration,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Whether the session is switched to read-only
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
            // introspection is a single query per fetch
            max_connections: 2,
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mysql://{}:{}", self.host, self.effective_port())?;
        if let Some(database) = &self.database {
            write!(f, "/{database}")?;
        }
        Ok(())
    }
}

impl ConnectionConfig {
    /// Creates a new connection config with safe defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Builder method to set the per-statement timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Port to connect to, falling back to the MySQL default.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_MYSQL_PORT)
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid or unsafe
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::SqlGuardError;

        if self.host.is_empty() {
            return Err(SqlGuardError::configuration("host cannot be empty"));
        }

        if self.port == Some(0) {
            return Err(SqlGuardError::configuration("port must be greater than 0"));
        }

        if let Some(database) = &self.database {
            crate::store::validate_database_name(database)?;
        }

        if self.max_connections == 0 {
            return Err(SqlGuardError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(SqlGuardError::configuration(
                "max_connections should not exceed 100 for safety",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(SqlGuardError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.is_zero() {
            return Err(SqlGuardError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, None);
        assert_eq!(config.effective_port(), 3306);
        assert!(config.read_only);
    }

    #[test]
    fn test_connection_config_validation() {
        assert!(ConnectionConfig::new("localhost".to_string()).validate().is_ok());

        let config = ConnectionConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            port: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            max_connections: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig::default().with_query_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_rejects_unsafe_database_name() {
        let config = ConnectionConfig::default().with_database("../etc".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_display_no_credentials() {
        let config = ConnectionConfig::new("example.com".to_string())
            .with_database("shop".to_string())
            .with_username("testuser".to_string());

        let display = config.to_string();
        assert_eq!(display, "mysql://example.com:3306/shop");
        assert!(!display.contains("testuser"));
    }
}
