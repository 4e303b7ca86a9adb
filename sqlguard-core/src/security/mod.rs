//! Security utilities for value escaping.
//!
//! # Module Structure
//! - `obfuscation`: reversible entity escaping applied to string-typed values
//!   before they are substituted into a query

pub mod obfuscation;

pub use obfuscation::{decode, decode_strict, encode, is_obfuscated_char};
