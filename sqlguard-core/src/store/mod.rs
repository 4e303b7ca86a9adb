//! Per-database schema cache with read-through fetching.
//!
//! [`SchemaStore`] sits between the sanitizer and two collaborators:
//! a [`SchemaPersistence`] backend that keeps raw schemas keyed by database
//! name, and a [`SchemaSource`] that introspects a live database on a miss.
//!
//! There is no expiry. A cached schema stays in use until it is replaced by
//! [`SchemaStore::refresh`] or removed by [`SchemaStore::evict`]. Concurrent
//! fetches for the same cold entry may both write; the last writer wins.

mod file;
mod memory;

pub use file::{JsonFileStore, to_cache_bytes};
pub use memory::MemoryStore;

use crate::error::{Result, SchemaError, SqlGuardError};
use crate::models::{RawSchema, Schema};
use std::path::Path;

/// Longest database name MySQL accepts.
const MAX_DATABASE_NAME_LEN: usize = 64;

/// Storage backend for raw schemas keyed by database name.
pub trait SchemaPersistence: Send + Sync {
    /// Returns the stored schema, or `None` when nothing is stored.
    ///
    /// # Errors
    /// Fails when stored data exists but cannot be read or parsed.
    fn load(&self, database: &str) -> Result<Option<RawSchema>>;

    /// Stores a schema, replacing any previous entry.
    ///
    /// # Errors
    /// Fails when the backend cannot persist the data.
    fn store(&self, database: &str, schema: &RawSchema) -> Result<()>;

    /// Deletes an entry. Returns whether one existed.
    ///
    /// # Errors
    /// Fails when the backend cannot delete the data.
    fn remove(&self, database: &str) -> Result<bool>;
}

/// Introspection collaborator producing the raw schema of one database.
pub trait SchemaSource {
    /// Reads every table and its column declarations.
    ///
    /// # Errors
    /// Propagates whatever failure the introspection hits.
    fn fetch_raw_schema(&self) -> Result<RawSchema>;
}

impl<F> SchemaSource for F
where
    F: Fn() -> Result<RawSchema>,
{
    fn fetch_raw_schema(&self) -> Result<RawSchema> {
        self()
    }
}

/// An already-fetched schema acts as its own source.
impl SchemaSource for RawSchema {
    fn fetch_raw_schema(&self) -> Result<RawSchema> {
        Ok(self.clone())
    }
}

/// Checks that a database name is safe to use as a cache key and file stem.
///
/// Accepted names are 1 to 64 characters from `[A-Za-z0-9_$-]`.
///
/// # Errors
/// Returns a configuration error for any other name.
pub fn validate_database_name(database: &str) -> Result<()> {
    let valid_chars = database
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'));

    if database.is_empty() || database.len() > MAX_DATABASE_NAME_LEN || !valid_chars {
        return Err(SqlGuardError::configuration(format!(
            "invalid database name '{database}': expected 1-{MAX_DATABASE_NAME_LEN} characters from [A-Za-z0-9_$-]"
        )));
    }
    Ok(())
}

/// Schema cache front end.
///
/// # Example
/// ```rust
/// use sqlguard_core::models::RawSchema;
/// use sqlguard_core::store::SchemaStore;
///
/// let store = SchemaStore::in_memory();
/// let live = RawSchema::new().with_table("users", [("age", "int")]);
///
/// assert!(store.load("shop").unwrap().is_none());
/// let schema = store.load_or_fetch("shop", Some(&live)).unwrap();
/// assert_eq!(schema.type_of("users", "age").unwrap().base_type, "int");
/// assert!(store.load("shop").unwrap().is_some());
/// ```
pub struct SchemaStore {
    persistence: Box<dyn SchemaPersistence>,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore").finish_non_exhaustive()
    }
}

impl SchemaStore {
    /// Creates a store over any persistence backend.
    pub fn new(persistence: impl SchemaPersistence + 'static) -> Self {
        Self {
            persistence: Box::new(persistence),
        }
    }

    /// Store backed by `<dir>/<database>.json` files.
    pub fn file(dir: impl AsRef<Path>) -> Self {
        Self::new(JsonFileStore::new(dir))
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Raw cached schema, without parsing.
    ///
    /// # Errors
    /// Fails on an invalid database name or unreadable cached data.
    pub fn load_raw(&self, database: &str) -> Result<Option<RawSchema>> {
        validate_database_name(database)?;
        self.persistence.load(database)
    }

    /// Cached schema, parsed. `None` on a miss.
    ///
    /// # Errors
    /// Fails on an invalid database name or unreadable cached data.
    pub fn load(&self, database: &str) -> Result<Option<Schema>> {
        Ok(self.load_raw(database)?.map(Schema::from))
    }

    /// Fetches from the source, persists the raw result and parses it.
    ///
    /// # Errors
    /// Propagates fetch and persistence failures. Nothing is written when the
    /// fetch fails.
    pub fn fetch_and_cache(&self, database: &str, source: &dyn SchemaSource) -> Result<Schema> {
        validate_database_name(database)?;

        let raw = source.fetch_raw_schema()?;
        self.persistence.store(database, &raw)?;

        tracing::info!(database, tables = raw.len(), "Cached fetched schema");
        Ok(Schema::from(raw))
    }

    /// Read-through lookup: the cached schema when present, otherwise a
    /// fetch through `source`.
    ///
    /// # Errors
    /// Returns [`SchemaError::PersistenceMissing`] on a miss without a source,
    /// plus any load, fetch or persistence failure.
    pub fn load_or_fetch(
        &self,
        database: &str,
        source: Option<&dyn SchemaSource>,
    ) -> Result<Schema> {
        if let Some(schema) = self.load(database)? {
            tracing::debug!(database, "Schema cache hit");
            return Ok(schema);
        }

        tracing::debug!(database, "Schema cache miss");
        match source {
            Some(source) => self.fetch_and_cache(database, source),
            None => Err(SchemaError::PersistenceMissing {
                database: database.to_string(),
            }
            .into()),
        }
    }

    /// Forced refetch, replacing whatever is cached.
    ///
    /// # Errors
    /// Propagates fetch and persistence failures. The old entry stays in place
    /// when the fetch fails.
    pub fn refresh(&self, database: &str, source: &dyn SchemaSource) -> Result<Schema> {
        tracing::debug!(database, "Refreshing cached schema");
        self.fetch_and_cache(database, source)
    }

    /// Removes a cached entry. Returns whether one existed.
    ///
    /// # Errors
    /// Fails on an invalid database name or a backend failure.
    pub fn evict(&self, database: &str) -> Result<bool> {
        validate_database_name(database)?;
        let removed = self.persistence.remove(database)?;
        if removed {
            tracing::info!(database, "Evicted cached schema");
        }
        Ok(removed)
    }
}
