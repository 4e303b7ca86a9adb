//! Reversible escaping of SQL-significant characters in string values.
//!
//! Each character of a fixed set is replaced with a numeric entity
//! `&<decimal codepoint>;`, e.g. `'` becomes `&39;`. Every other character is
//! copied through unchanged. `&` and `;` are members of the set, so entity
//! text in the input is itself escaped and [`decode`] restores the exact
//! original.
//!
//! # Example
//! ```rust
//! use sqlguard_core::security::obfuscation::{decode, encode};
//!
//! let encoded = encode("O'Brien; --");
//! assert_eq!(encoded, "O&39;Brien&59; &45;&45;");
//! assert_eq!(decode(&encoded), "O'Brien; --");
//! ```

use crate::error::{Result, SqlGuardError};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

/// Characters rewritten by [`encode`].
pub const OBFUSCATED_CHARS: [char; 24] = [
    '\'', '"', ';', '-', '*', '(', ')', '=', '<', '>', '%', '_', '|', '\\', ',', '@', '#', '`',
    '^', '~', '&', '$', '!', '/',
];

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(r"&([0-9]+);").expect("Invalid entity pattern"))
}

/// Whether `c` belongs to the escaped character set.
pub fn is_obfuscated_char(c: char) -> bool {
    OBFUSCATED_CHARS.contains(&c)
}

/// Escapes every character of the fixed set in a single pass.
pub fn encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        if is_obfuscated_char(c) {
            let _ = write!(encoded, "&{};", u32::from(c));
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// Restores characters escaped by [`encode`].
///
/// `&N;` sequences whose codepoint is outside the escaped set are left as
/// they are.
pub fn decode(value: &str) -> String {
    entity_pattern()
        .replace_all(value, |caps: &regex::Captures<'_>| match tracked_char(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Like [`decode`], but rejects entity sequences that [`encode`] never emits.
///
/// # Errors
/// Returns [`SqlGuardError::Obfuscation`] naming the first untracked sequence
/// and its byte offset.
pub fn decode_strict(value: &str) -> Result<String> {
    if let Some(caps) = entity_pattern()
        .captures_iter(value)
        .find(|caps| tracked_char(&caps[1]).is_none())
        && let Some(whole) = caps.get(0)
    {
        return Err(SqlGuardError::Obfuscation {
            sequence: whole.as_str().to_string(),
            position: whole.start(),
        });
    }
    Ok(decode(value))
}

fn tracked_char(digits: &str) -> Option<char> {
    digits
        .parse::<u32>()
        .ok()
        .and_then(char::from_u32)
        .filter(|c| is_obfuscated_char(*c))
}
