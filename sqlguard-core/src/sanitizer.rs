//! Request-level entry point tying the schema store to the engine.

use crate::config::GuardConfig;
use crate::engine::{self, SanitizedQuery};
use crate::error::Result;
use crate::models::Schema;
use crate::store::{SchemaSource, SchemaStore, validate_database_name};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One template to sanitize against one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeRequest {
    /// Query text with `::field::` placeholders
    pub template: String,
    /// Table every placeholder belongs to
    pub table: String,
    /// Raw parameter values keyed by field name
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl SanitizeRequest {
    /// Creates a request without parameters.
    pub fn new(template: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            table: table.into(),
            parameters: HashMap::new(),
        }
    }

    /// Builder method to add one parameter.
    pub fn with_parameter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(field.into(), value.into());
        self
    }
}

/// Sanitizes requests for one database.
///
/// The schema is read through the store on every call, so a
/// [`SchemaStore::refresh`] made elsewhere takes effect on the next request.
///
/// # Example
/// ```rust
/// use sqlguard_core::{GuardConfig, SanitizeRequest, Sanitizer, SchemaStore};
/// use sqlguard_core::models::RawSchema;
///
/// let live = RawSchema::new().with_table("users", [("name", "varchar(10)")]);
/// let sanitizer = Sanitizer::new(SchemaStore::in_memory(), "shop", GuardConfig::default())
///     .unwrap()
///     .with_source(live);
///
/// let request = SanitizeRequest::new("SELECT * FROM users WHERE name = ::name::", "users")
///     .with_parameter("name", "Bob");
/// let query = sanitizer.sanitize(&request).unwrap();
/// assert_eq!(query.as_str(), r#"SELECT * FROM users WHERE name = "Bob""#);
/// ```
pub struct Sanitizer {
    store: SchemaStore,
    database: String,
    source: Option<Box<dyn SchemaSource>>,
    config: GuardConfig,
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer")
            .field("database", &self.database)
            .field("has_source", &self.source.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Sanitizer {
    /// Creates a sanitizer for `database` that only uses cached schemas.
    ///
    /// # Errors
    /// Returns a configuration error for an invalid database name or config.
    pub fn new(store: SchemaStore, database: impl Into<String>, config: GuardConfig) -> Result<Self> {
        let database = database.into();
        validate_database_name(&database)?;
        config.validate()?;

        Ok(Self {
            store,
            database,
            source: None,
            config,
        })
    }

    /// Creates a sanitizer over the JSON file cache in `config.cache_dir`.
    ///
    /// # Errors
    /// Returns a configuration error for an invalid database name or config.
    pub fn from_config(database: impl Into<String>, config: GuardConfig) -> Result<Self> {
        let store = SchemaStore::file(&config.cache_dir);
        Self::new(store, database, config)
    }

    /// Builder method to fetch the schema from `source` on a cache miss.
    pub fn with_source(mut self, source: impl SchemaSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Database this sanitizer is scoped to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Underlying schema store.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Current configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Loads the schema (fetching on a miss when a source is set) and
    /// sanitizes the request.
    ///
    /// # Errors
    /// Schema loading failures and every rejection of [`engine::sanitize`].
    pub fn sanitize(&self, request: &SanitizeRequest) -> Result<SanitizedQuery> {
        let schema = self
            .store
            .load_or_fetch(&self.database, self.source.as_deref())?;
        self.with_schema(&schema, request)
    }

    /// Sanitizes against an already loaded schema, bypassing the store.
    ///
    /// # Errors
    /// Every rejection of [`engine::sanitize`].
    pub fn with_schema(&self, schema: &Schema, request: &SanitizeRequest) -> Result<SanitizedQuery> {
        let result = engine::sanitize(
            &request.template,
            &request.table,
            schema,
            &request.parameters,
            self.config.unimplemented,
        );

        match &result {
            Ok(_) => tracing::debug!(database = %self.database, table = %request.table, "Query sanitized"),
            Err(e) => {
                // the message may quote the rejected value
                tracing::trace!(database = %self.database, error = %e, "Rejection detail");
                tracing::info!(
                    database = %self.database,
                    table = %request.table,
                    reason = e.kind(),
                    field = e.field_name(),
                    "Query rejected"
                );
            }
        }
        result
    }
}
