//! Column declaration introspection.

use crate::Result;
use crate::error::SqlGuardError;
use crate::models::RawSchema;
use sqlx::{MySqlPool, Row};

// Cast to CHAR to avoid VARBINARY results on MySQL 8.0+. COLUMN_TYPE carries
// the full declaration as DESCRIBE prints it, e.g. `decimal(10,2) unsigned`.
const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(COLUMN_TYPE AS CHAR) AS column_type
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = ?
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

/// Reads every table of `database` with its column declarations, tables in
/// name order and columns in definition order.
///
/// # Errors
/// Returns a collection error if the query fails or a row cannot be decoded.
pub async fn fetch_raw_schema(pool: &MySqlPool, database: &str) -> Result<RawSchema> {
    tracing::info!(database, "Introspecting MySQL schema");

    let rows = sqlx::query(COLUMNS_QUERY)
        .bind(database)
        .fetch_all(pool)
        .await
        .map_err(|e| SqlGuardError::collection_failed("Failed to query column metadata", e))?;

    let mut schema = RawSchema::new();
    for row in &rows {
        let table: String = row
            .try_get("table_name")
            .map_err(|e| SqlGuardError::collection_failed("Failed to decode table name", e))?;
        let column: String = row
            .try_get("column_name")
            .map_err(|e| SqlGuardError::collection_failed("Failed to decode column name", e))?;
        let declaration: String = row
            .try_get("column_type")
            .map_err(|e| SqlGuardError::collection_failed("Failed to decode column type", e))?;

        schema.push_column(table, column, declaration);
    }

    tracing::info!(database, tables = schema.len(), columns = rows.len(), "Schema introspected");
    Ok(schema)
}
