//! In-process persistence.

use super::SchemaPersistence;
use crate::error::Result;
use crate::models::RawSchema;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Schemas held in a map for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, RawSchema>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RawSchema>> {
        // entries are replaced whole, so a panicked writer cannot leave one torn
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchemaPersistence for MemoryStore {
    fn load(&self, database: &str) -> Result<Option<RawSchema>> {
        Ok(self.entries().get(database).cloned())
    }

    fn store(&self, database: &str, schema: &RawSchema) -> Result<()> {
        self.entries().insert(database.to_string(), schema.clone());
        Ok(())
    }

    fn remove(&self, database: &str) -> Result<bool> {
        Ok(self.entries().remove(database).is_some())
    }
}
