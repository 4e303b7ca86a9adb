use super::*;
use crate::error::SchemaError;
use crate::models::RawSchema;

fn users_schema() -> Schema {
    Schema::from(RawSchema::new().with_table(
        "users",
        [
            ("id", "int"),
            ("age", "int"),
            ("name", "varchar(10)"),
            ("bio", "text"),
            ("balance", "decimal(5,2)"),
            ("born", "date"),
            ("seen", "timestamp"),
            ("doc", "json"),
        ],
    ))
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn run(template: &str, pairs: &[(&str, &str)]) -> Result<SanitizedQuery> {
    sanitize(
        template,
        "users",
        &users_schema(),
        &params(pairs),
        UnimplementedPolicy::Reject,
    )
}

#[test]
fn test_scan_finds_markers_in_order() {
    let found = scan_placeholders("::b:: ::a:: ::b::");
    let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["b", "a", "b"]);
    assert_eq!(found[1].span, 6..11);
}

#[test]
fn test_scan_ignores_malformed_markers() {
    assert!(scan_placeholders("SELECT 1").is_empty());
    assert!(scan_placeholders(":: ::").is_empty());
    assert!(scan_placeholders("::a-b::").is_empty());
    assert!(scan_placeholders("::[x]::").is_empty());
    assert!(scan_placeholders(&format!("::{}::", "n".repeat(65))).is_empty());
    assert_eq!(scan_placeholders(&format!("::{}::", "n".repeat(64))).len(), 1);
}

#[test]
fn test_integer_substituted_bare() {
    let query = run("INSERT INTO users (age) VALUES (::age::)", &[("age", "30")]).unwrap();
    assert_eq!(query.as_str(), "INSERT INTO users (age) VALUES (30)");
}

#[test]
fn test_varchar_substituted_quoted() {
    let query = run("SELECT * FROM users WHERE name = ::name::", &[("name", "Bob")]).unwrap();
    assert_eq!(query.to_string(), "SELECT * FROM users WHERE name = \"Bob\"");
}

#[test]
fn test_string_values_are_escaped() {
    let query = run("UPDATE users SET bio = ::bio::", &[("bio", "say \"hi\"; --")]).unwrap();
    assert_eq!(
        query.into_inner(),
        "UPDATE users SET bio = \"say &34;hi&34;&59; &45;&45;\""
    );
}

#[test]
fn test_injection_rejected_by_length() {
    let error = run(
        "SELECT * FROM users WHERE name = ::name::",
        &[("name", "'; DROP TABLE users; --")],
    )
    .unwrap_err();

    match error {
        SqlGuardError::Validation {
            field_name,
            base_type,
            raw_value,
        } => {
            assert_eq!(field_name, "name");
            assert_eq!(base_type, "varchar");
            assert_eq!(raw_value, "'; DROP TABLE users; --");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_column_aborts_everything() {
    let error = run(
        "UPDATE users SET age = ::age:: WHERE x = ::ghost::",
        &[("age", "30"), ("ghost", "1")],
    )
    .unwrap_err();

    assert!(matches!(
        error,
        SqlGuardError::Schema(SchemaError::UnknownColumn { ref column, .. }) if column == "ghost"
    ));
}

#[test]
fn test_unknown_table() {
    let error = sanitize(
        "SELECT * FROM orders WHERE id = ::id::",
        "orders",
        &users_schema(),
        &params(&[("id", "1")]),
        UnimplementedPolicy::Reject,
    )
    .unwrap_err();

    assert!(matches!(
        error,
        SqlGuardError::Schema(SchemaError::UnknownTable { .. })
    ));
}

#[test]
fn test_missing_parameter() {
    let error = run("SELECT * FROM users WHERE id = ::id::", &[]).unwrap_err();
    assert!(matches!(
        error,
        SqlGuardError::MissingParameter { ref field_name } if field_name == "id"
    ));
}

#[test]
fn test_first_failure_wins() {
    let error = run(
        "UPDATE users SET age = ::age::, name = ::name::",
        &[("age", "old"), ("name", "much too long a name")],
    )
    .unwrap_err();

    assert!(matches!(
        error,
        SqlGuardError::Validation { ref field_name, .. } if field_name == "age"
    ));
}

#[test]
fn test_repeated_placeholder_substituted_each_time() {
    let query = run(
        "SELECT * FROM users WHERE id = ::id:: OR age = ::id::",
        &[("id", "7")],
    )
    .unwrap();
    assert_eq!(query.as_str(), "SELECT * FROM users WHERE id = 7 OR age = 7");
}

#[test]
fn test_substituted_text_is_not_rescanned() {
    let query = run(
        "SELECT * FROM users WHERE bio = ::bio:: AND id = ::id::",
        &[("bio", "::id::"), ("id", "1")],
    )
    .unwrap();
    assert_eq!(
        query.as_str(),
        "SELECT * FROM users WHERE bio = \"::id::\" AND id = 1"
    );
}

#[test]
fn test_template_without_placeholders_passes_through() {
    let template = "SELECT 'literal; --' FROM users";
    assert_eq!(run(template, &[]).unwrap().as_str(), template);
}

#[test]
fn test_decimal_and_date_bare() {
    let query = run(
        "INSERT INTO users (balance, born) VALUES (::balance::, '::born::')",
        &[("balance", "123.45"), ("born", "2024-02-29")],
    )
    .unwrap();
    assert_eq!(
        query.as_str(),
        "INSERT INTO users (balance, born) VALUES (123.45, '2024-02-29')"
    );

    assert!(run("SELECT ::born::", &[("born", "2024-02-30")]).is_err());
}

#[test]
fn test_unrecognized_type_passes_through() {
    let query = run("UPDATE users SET doc = ::doc::", &[("doc", "{}")]).unwrap();
    assert_eq!(query.as_str(), "UPDATE users SET doc = {}");
}

#[test]
fn test_timestamp_follows_policy() {
    let template = "UPDATE users SET seen = '::seen::'";
    let parameters = params(&[("seen", "2024-09-03 14:55:00")]);

    let error = run(template, &[("seen", "2024-09-03 14:55:00")]).unwrap_err();
    assert!(matches!(
        error,
        SqlGuardError::UnimplementedValidator { ref base_type, .. } if base_type == "timestamp"
    ));

    let query = sanitize(
        template,
        "users",
        &users_schema(),
        &parameters,
        UnimplementedPolicy::Accept,
    )
    .unwrap();
    assert_eq!(query.as_str(), "UPDATE users SET seen = '2024-09-03 14:55:00'");
}
