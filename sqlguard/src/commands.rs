//! Command handlers.
//!
//! Handlers write their result to the given writer (stdout in the binary)
//! and leave logging to `tracing`, which goes to stderr.

use crate::{DecodeArgs, GlobalArgs, SanitizeArgs, SchemaCommand, collect_parameters};
use anyhow::Context;
use sqlguard_core::error::redact_database_url;
use sqlguard_core::security::obfuscation;
use sqlguard_core::store::to_cache_bytes;
use sqlguard_core::{
    GuardConfig, RawSchema, SanitizeRequest, Sanitizer, SchemaError, SchemaStore, SqlGuardError,
};
use std::io::Write;
use tracing::info;

/// Whether an error is a rejection of the caller's query or parameters.
pub fn is_rejection(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<SqlGuardError>()
        .is_some_and(SqlGuardError::is_rejection)
}

/// `sqlguard sanitize`
///
/// # Errors
/// Rejections surface as [`SqlGuardError`] inside the returned error; see
/// [`is_rejection`].
pub async fn sanitize(
    global: &GlobalArgs,
    args: &SanitizeArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let database = resolve_database(args)?;
    let parameters = collect_parameters(args)?;

    let config = GuardConfig::default()
        .with_cache_dir(&global.cache_dir)
        .with_unimplemented_policy(args.unimplemented_policy());
    let mut sanitizer = Sanitizer::from_config(&database, config)?;

    if sanitizer.store().load_raw(&database)?.is_none()
        && let Some(url) = &args.database_url
    {
        info!(database = %database, "No cached schema, introspecting live database");
        let raw = fetch_live_schema(url).await?;
        sanitizer = sanitizer.with_source(raw);
    }

    let request = SanitizeRequest {
        template: args.query.clone(),
        table: args.table.clone(),
        parameters,
    };
    let query = sanitizer.sanitize(&request)?;

    writeln!(out, "{query}").context("Failed to write sanitized query")?;
    Ok(())
}

/// `sqlguard schema ...`
///
/// # Errors
/// Fails on introspection, cache or output failures.
pub async fn schema(
    global: &GlobalArgs,
    action: &SchemaCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let store = SchemaStore::file(&global.cache_dir);

    match action {
        SchemaCommand::Fetch { database_url } => {
            info!("Target: {}", redact_database_url(database_url));
            let database = database_from_url(database_url)?;
            let raw = fetch_live_schema(database_url).await?;
            let schema = store.refresh(&database, &raw)?;

            writeln!(
                out,
                "Cached {} tables for '{}' in {}",
                schema.table_count(),
                database,
                global.cache_dir.display()
            )?;
        }
        SchemaCommand::Show { database } => {
            let raw = store
                .load_raw(database)?
                .ok_or_else(|| SchemaError::PersistenceMissing {
                    database: database.clone(),
                })?;
            out.write_all(&to_cache_bytes(&raw)?)
                .context("Failed to write cached schema")?;
            writeln!(out)?;
        }
        SchemaCommand::Evict { database } => {
            if store.evict(database)? {
                writeln!(out, "Evicted cached schema for '{database}'")?;
            } else {
                writeln!(out, "No cached schema for '{database}'")?;
            }
        }
    }

    Ok(())
}

/// `sqlguard decode`
///
/// # Errors
/// With `--strict`, fails on entity sequences the encoder never produces.
pub fn decode(args: &DecodeArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let decoded = if args.strict {
        obfuscation::decode_strict(&args.value)?
    } else {
        obfuscation::decode(&args.value)
    };
    writeln!(out, "{decoded}")?;
    Ok(())
}

fn resolve_database(args: &SanitizeArgs) -> sqlguard_core::Result<String> {
    let from_url = args
        .database_url
        .as_deref()
        .map(database_from_url)
        .transpose()?;

    match (&args.database, from_url) {
        (Some(explicit), Some(url_db)) if *explicit != url_db => {
            Err(SqlGuardError::configuration(format!(
                "--database '{explicit}' does not match the database of --database-url ('{url_db}')"
            )))
        }
        (Some(explicit), _) => Ok(explicit.clone()),
        (None, Some(url_db)) => Ok(url_db),
        (None, None) => Err(SqlGuardError::configuration(
            "No Database Selected: pass --database or --database-url",
        )),
    }
}

#[cfg(feature = "mysql")]
fn database_from_url(url: &str) -> sqlguard_core::Result<String> {
    let config = sqlguard_core::adapters::mysql::parse_mysql_connection_config(url)?;
    config
        .database
        .ok_or_else(|| SqlGuardError::configuration("No Database Selected"))
}

#[cfg(feature = "mysql")]
async fn fetch_live_schema(url: &str) -> sqlguard_core::Result<RawSchema> {
    let adapter = sqlguard_core::MySqlAdapter::new(url).await?;
    let raw = adapter.fetch_raw_schema().await;
    adapter.close().await;
    raw
}

#[cfg(not(feature = "mysql"))]
fn database_from_url(_url: &str) -> sqlguard_core::Result<String> {
    Err(mysql_disabled())
}

#[cfg(not(feature = "mysql"))]
#[allow(clippy::unused_async)]
async fn fetch_live_schema(_url: &str) -> sqlguard_core::Result<RawSchema> {
    Err(mysql_disabled())
}

#[cfg(not(feature = "mysql"))]
fn mysql_disabled() -> SqlGuardError {
    SqlGuardError::configuration("sqlguard was built without the `mysql` feature")
}
