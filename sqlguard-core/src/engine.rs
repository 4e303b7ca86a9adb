//! Placeholder substitution engine.
//!
//! A template carries `::name::` placeholders in value positions. Each one is
//! resolved to a column of the target table, its parameter is checked by the
//! validator for the column type, and the value is substituted: string-like
//! columns get the escaped value inside double quotes, every other type gets
//! the raw value.
//!
//! The first failure aborts the call. The output is assembled from template
//! slices and substitutions in one pass, so substituted text is never scanned
//! again and a failed call never yields a partial query.

use crate::config::UnimplementedPolicy;
use crate::error::{Result, SqlGuardError};
use crate::models::{Schema, TypeDeclaration};
use crate::security::obfuscation;
use crate::validation::{self, Verdict};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

/// One `::name::` occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Field name between the delimiters
    pub name: String,
    /// Byte range of the whole marker, delimiters included
    pub span: Range<usize>,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| {
        Regex::new(r"::([A-Za-z0-9_]{1,64})::").expect("Invalid placeholder pattern")
    })
}

/// Finds every placeholder, left to right, without overlap.
///
/// Repeated names are reported once per occurrence.
///
/// # Example
/// ```rust
/// use sqlguard_core::engine::scan_placeholders;
///
/// let found = scan_placeholders("UPDATE t SET a = ::a:: WHERE id = ::id::");
/// let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, ["a", "id"]);
/// assert_eq!(found[0].span, 17..22);
/// ```
pub fn scan_placeholders(template: &str) -> Vec<Placeholder> {
    placeholder_pattern()
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(Placeholder {
                name: name.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// A template with every placeholder validated and substituted.
///
/// Only [`sanitize`] produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery(String);

impl SanitizedQuery {
    /// The query text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the query text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SanitizedQuery> for String {
    fn from(query: SanitizedQuery) -> Self {
        query.0
    }
}

/// Validates and substitutes every placeholder of `template`.
///
/// # Errors
/// Fails on the first placeholder that:
/// - names a table or column missing from `schema` ([`crate::SchemaError`])
/// - has no entry in `parameters` ([`SqlGuardError::MissingParameter`])
/// - fails its type validator ([`SqlGuardError::Validation`])
/// - has a type without a decided rule while `policy` is
///   [`UnimplementedPolicy::Reject`] ([`SqlGuardError::UnimplementedValidator`])
///
/// # Example
/// ```rust
/// use std::collections::HashMap;
/// use sqlguard_core::config::UnimplementedPolicy;
/// use sqlguard_core::engine::sanitize;
/// use sqlguard_core::models::{RawSchema, Schema};
///
/// let schema = Schema::from(RawSchema::new().with_table("users", [("age", "int")]));
/// let parameters = HashMap::from([("age".to_string(), "30".to_string())]);
///
/// let query = sanitize(
///     "INSERT INTO users (age) VALUES (::age::)",
///     "users",
///     &schema,
///     &parameters,
///     UnimplementedPolicy::Reject,
/// )
/// .unwrap();
/// assert_eq!(query.as_str(), "INSERT INTO users (age) VALUES (30)");
/// ```
pub fn sanitize(
    template: &str,
    table: &str,
    schema: &Schema,
    parameters: &HashMap<String, String>,
    policy: UnimplementedPolicy,
) -> Result<SanitizedQuery> {
    let placeholders = scan_placeholders(template);
    tracing::debug!(table, placeholders = placeholders.len(), "Sanitizing template");

    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;

    for placeholder in &placeholders {
        let field_name = placeholder.name.as_str();
        let declaration = schema.type_of(table, field_name)?;
        let raw_value = parameters
            .get(field_name)
            .ok_or_else(|| SqlGuardError::missing_parameter(field_name))?;

        check_value(field_name, declaration, raw_value, policy)?;

        output.push_str(&template[cursor..placeholder.span.start]);
        push_literal(&mut output, declaration, raw_value);
        cursor = placeholder.span.end;
    }
    output.push_str(&template[cursor..]);

    Ok(SanitizedQuery(output))
}

fn check_value(
    field_name: &str,
    declaration: &TypeDeclaration,
    raw_value: &str,
    policy: UnimplementedPolicy,
) -> Result<()> {
    let verdict = validation::validate(&declaration.kind(), raw_value, &declaration.arguments);
    tracing::trace!(field_name, declaration = %declaration, raw_value, ?verdict, "Validated placeholder");

    match (verdict, policy) {
        (Verdict::Valid, _) => Ok(()),
        (Verdict::Invalid, _) => Err(SqlGuardError::validation(
            field_name,
            &declaration.base_type,
            raw_value,
        )),
        (Verdict::Unimplemented, UnimplementedPolicy::Accept) => {
            tracing::warn!(
                field_name,
                base_type = %declaration.base_type,
                "Substituting value of a type without a validation rule"
            );
            Ok(())
        }
        (Verdict::Unimplemented, UnimplementedPolicy::Reject) => Err(
            SqlGuardError::unimplemented_validator(field_name, &declaration.base_type),
        ),
    }
}

fn push_literal(output: &mut String, declaration: &TypeDeclaration, raw_value: &str) {
    if declaration.is_string_like() {
        output.push('"');
        output.push_str(&obfuscation::encode(raw_value));
        output.push('"');
    } else {
        output.push_str(raw_value);
    }
}

#[cfg(test)]
mod tests;
