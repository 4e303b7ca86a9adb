//! Schema-aware sanitization of SQL query templates.
//!
//! Templates name their value positions with `::field::` placeholders. Each
//! placeholder is resolved to a column of the target table, the supplied
//! value is checked against that column's declared type, and only then is it
//! substituted. String values are additionally escaped and quoted.
//!
//! # Security Guarantees
//! - A value reaches the query only after passing its column type validator
//! - Any rejection aborts the whole call; partial queries are never returned
//! - Introspection runs on read-only sessions (feature `mysql`)
//! - Credentials are redacted from every log line and error message
//!
//! # Architecture
//! - [`validation`]: per-type validators behind a closed [`models::ColumnKind`]
//! - [`security::obfuscation`]: reversible escaping of string values
//! - [`store`]: per-database schema cache with read-through fetching
//! - [`engine`]: placeholder scanning, validation and substitution
//! - [`sanitizer`]: request-level glue scoped to one database
//!
//! # Example
//! ```rust
//! use sqlguard_core::{GuardConfig, SanitizeRequest, Sanitizer, SchemaStore, SqlGuardError};
//! use sqlguard_core::models::RawSchema;
//!
//! let live = RawSchema::new().with_table("users", [("name", "varchar(10)")]);
//! let sanitizer = Sanitizer::new(SchemaStore::in_memory(), "shop", GuardConfig::default())?
//!     .with_source(live);
//!
//! let attack = SanitizeRequest::new("SELECT * FROM users WHERE name = ::name::", "users")
//!     .with_parameter("name", "'; DROP TABLE users; --");
//! assert!(matches!(
//!     sanitizer.sanitize(&attack),
//!     Err(SqlGuardError::Validation { .. })
//! ));
//! # Ok::<(), SqlGuardError>(())
//! ```

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod sanitizer;
pub mod security;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{ConnectionConfig, GuardConfig, UnimplementedPolicy};
pub use engine::{Placeholder, SanitizedQuery, sanitize, scan_placeholders};
pub use error::{Result, SchemaError, SqlGuardError};
pub use models::{ColumnKind, RawSchema, RawTable, Schema, TypeDeclaration};
pub use sanitizer::{SanitizeRequest, Sanitizer};
pub use store::{JsonFileStore, MemoryStore, SchemaPersistence, SchemaSource, SchemaStore};
pub use validation::{Verdict, is_valid, validate};

#[cfg(feature = "mysql")]
pub use adapters::mysql::MySqlAdapter;
