//! Configuration types.
//!
//! - `GuardConfig`: schema cache location and validation policy
//! - `ConnectionConfig`: settings for the introspection connection
//!
//! # Security
//! Neither struct stores passwords. Credentials stay inside the connection
//! URL held by the adapter.

mod connection;
mod guard;

pub use connection::ConnectionConfig;
pub use guard::{DEFAULT_CACHE_DIR, GuardConfig, UnimplementedPolicy};
