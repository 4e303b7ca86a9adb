//! Sanitization settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding `<database>.json` schema files unless overridden.
pub const DEFAULT_CACHE_DIR: &str = "config";

/// What to do with a value whose column type has no decided validation rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnimplementedPolicy {
    /// Refuse the value
    #[default]
    Reject,
    /// Substitute the value unchecked
    Accept,
}

impl std::fmt::Display for UnimplementedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Accept => write!(f, "accept"),
        }
    }
}

/// Settings shared by every sanitization call of a [`crate::Sanitizer`].
///
/// # Example
/// ```rust
/// use sqlguard_core::config::{GuardConfig, UnimplementedPolicy};
///
/// let config = GuardConfig::default()
///     .with_cache_dir("/var/cache/sqlguard")
///     .with_unimplemented_policy(UnimplementedPolicy::Accept);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Directory of the file-backed schema cache
    pub cache_dir: PathBuf,
    /// Handling of types without a validation rule
    pub unimplemented: UnimplementedPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            unimplemented: UnimplementedPolicy::default(),
        }
    }
}

impl GuardConfig {
    /// Builder method to set the cache directory.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Builder method to set the unimplemented-type policy.
    pub fn with_unimplemented_policy(mut self, policy: UnimplementedPolicy) -> Self {
        self.unimplemented = policy;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the cache directory is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(crate::error::SqlGuardError::configuration(
                "cache_dir cannot be empty",
            ));
        }
        Ok(())
    }
}
