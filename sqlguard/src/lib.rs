//! Library module for the sqlguard CLI.
//!
//! Argument types and command handlers live here so they can be exercised
//! from tests; `main.rs` only parses, sets up logging and maps the outcome
//! to an exit code.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use sqlguard_core::config::DEFAULT_CACHE_DIR;
use sqlguard_core::{SqlGuardError, UnimplementedPolicy};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "sqlguard")]
#[command(about = "Schema-aware SQL template sanitizer")]
#[command(version)]
#[command(long_about = "
sqlguard - validate query parameters against declared column types

Templates mark value positions with ::field:: placeholders. Every value is
checked against the type of the column it populates before it is
substituted; string values are escaped and quoted. Any rejection aborts the
whole query.

Schemas are cached as <cache-dir>/<database>.json and only refetched on
demand (`sqlguard schema fetch`).

EXAMPLES:
  sqlguard schema fetch --database-url mysql://reader@localhost/shop
  sqlguard sanitize --database shop --table users \\
      --query 'SELECT * FROM users WHERE name = ::name::' --param name=Bob
  sqlguard decode 'O&39;Brien'
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted before or after any subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,

    /// Schema cache directory
    #[arg(
        long,
        global = true,
        env = "SQLGUARD_CACHE_DIR",
        default_value = DEFAULT_CACHE_DIR,
        help = "Directory holding <database>.json schema files"
    )]
    pub cache_dir: PathBuf,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate parameters and print the sanitized query
    Sanitize(SanitizeArgs),
    /// Manage cached schemas
    Schema {
        #[command(subcommand)]
        action: SchemaCommand,
    },
    /// Reverse the escaping applied to string values
    Decode(DecodeArgs),
}

/// Arguments of `sqlguard sanitize`
#[derive(Debug, Args)]
pub struct SanitizeArgs {
    /// Database whose cached schema is used
    #[arg(long, help = "Database name (defaults to the database of --database-url)")]
    pub database: Option<String>,

    /// Table every placeholder belongs to
    #[arg(long)]
    pub table: String,

    /// Query template
    #[arg(long, help = "Query template with ::field:: placeholders")]
    pub query: String,

    /// Parameter values
    #[arg(
        long = "param",
        value_name = "FIELD=VALUE",
        value_parser = parse_param,
        help = "Parameter value, repeatable; overrides --params-file"
    )]
    pub params: Vec<(String, String)>,

    /// JSON object of parameter values
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Connection used to fetch the schema on a cache miss
    #[arg(
        long,
        env = "DATABASE_URL",
        hide_env_values = true,
        help = "MySQL URL used on a cache miss (credentials are never logged)"
    )]
    pub database_url: Option<String>,

    /// Substitute values of types that have no validation rule
    #[arg(long, help = "Accept values of types without a validation rule (timestamp)")]
    pub accept_unimplemented: bool,
}

impl SanitizeArgs {
    /// Policy selected by the flags.
    pub fn unimplemented_policy(&self) -> UnimplementedPolicy {
        if self.accept_unimplemented {
            UnimplementedPolicy::Accept
        } else {
            UnimplementedPolicy::Reject
        }
    }
}

/// Schema cache subcommands
#[derive(Debug, Subcommand)]
pub enum SchemaCommand {
    /// Introspect a live database and replace its cached schema
    Fetch {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
    /// Print a cached schema
    Show {
        #[arg(long)]
        database: String,
    },
    /// Delete a cached schema
    Evict {
        #[arg(long)]
        database: String,
    },
}

/// Arguments of `sqlguard decode`
#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Escaped value
    pub value: String,

    /// Fail on entity sequences the encoder never produces
    #[arg(long)]
    pub strict: bool,
}

/// Parses one `FIELD=VALUE` pair. Only the first `=` separates.
///
/// # Errors
/// Returns a message when there is no `=` or the field name is empty.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    if field.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Reads a JSON object of parameter values.
///
/// Strings are taken as is; numbers and booleans are converted to their JSON
/// text so `{"age": 30}` works like `--param age=30`.
///
/// # Errors
/// Fails when the file cannot be read, is not a JSON object, or holds
/// nested values or nulls.
pub fn load_params_file(path: &Path) -> sqlguard_core::Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SqlGuardError::io(format!("Failed to read parameters file {}", path.display()), e)
    })?;

    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)
        .map_err(|e| {
            SqlGuardError::serialization(
                format!("Parameters file {} is not a JSON object", path.display()),
                e,
            )
        })?;

    object
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(SqlGuardError::configuration(format!(
                        "parameter '{field}' must be a string, number or boolean, got {other}"
                    )));
                }
            };
            Ok((field, text))
        })
        .collect()
}

/// Merges file parameters with command-line parameters, the latter winning.
///
/// # Errors
/// Propagates [`load_params_file`] failures.
pub fn collect_parameters(args: &SanitizeArgs) -> sqlguard_core::Result<HashMap<String, String>> {
    let mut parameters = match &args.params_file {
        Some(path) => load_params_file(path)?,
        None => HashMap::new(),
    };
    parameters.extend(args.params.iter().cloned());
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("name=Bob").unwrap(),
            ("name".to_string(), "Bob".to_string())
        );
        assert_eq!(
            parse_param("expr=1=1").unwrap(),
            ("expr".to_string(), "1=1".to_string())
        );
        assert_eq!(
            parse_param("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_load_params_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"age": 30, "name": "Bob", "active": true}"#).unwrap();

        let params = load_params_file(&path).unwrap();
        assert_eq!(params["age"], "30");
        assert_eq!(params["name"], "Bob");
        assert_eq!(params["active"], "true");
    }

    #[test]
    fn test_load_params_file_rejects_nested_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");

        std::fs::write(&path, r#"{"tags": ["a"]}"#).unwrap();
        assert!(matches!(
            load_params_file(&path),
            Err(SqlGuardError::Configuration { .. })
        ));

        std::fs::write(&path, r#"["a"]"#).unwrap();
        assert!(matches!(
            load_params_file(&path),
            Err(SqlGuardError::Serialization { .. })
        ));
    }
}
