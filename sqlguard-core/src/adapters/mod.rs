//! Database collaborators.
//!
//! Each adapter introspects a live database and hands back a
//! [`crate::models::RawSchema`] for the schema store. Adapters are gated
//! behind cargo features so the core library builds without any driver.

#[cfg(feature = "mysql")]
pub mod mysql;
