//! MySQL introspection integration tests.
//!
//! This test suite covers:
//! - Column declarations read from INFORMATION_SCHEMA
//! - Table and column ordering in the fetched schema
//! - Caching the fetched schema and sanitizing against it
//! - Read-only enforcement on introspection sessions

#![cfg(feature = "mysql")]
#![allow(clippy::unwrap_used)]

use sqlguard_core::{
    GuardConfig, Result, SanitizeRequest, Sanitizer, SchemaStore, SqlGuardError,
    adapters::mysql::MySqlAdapter,
};
use sqlx::MySqlPool;
use std::time::Duration;
use testcontainers_modules::{mysql::Mysql, testcontainers::runners::AsyncRunner};

/// Helper function to wait for MySQL to be ready
async fn wait_for_mysql_ready(database_url: &str, max_attempts: u32) -> Result<()> {
    let mut attempts = 0;
    while attempts < max_attempts {
        if let Ok(pool) = MySqlPool::connect(database_url).await {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                pool.close().await;
                return Ok(());
            }
            pool.close().await;
        }
        attempts += 1;
        if attempts < max_attempts {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    Err(SqlGuardError::connection_failed(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("MySQL failed to become ready after {max_attempts} attempts"),
    )))
}

async fn create_shop_tables(database_url: &str) {
    let pool = MySqlPool::connect(database_url).await.unwrap();
    sqlx::query(
        "CREATE TABLE users (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(10) NOT NULL,
            bio TEXT,
            born DATE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        "CREATE TABLE orders (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            user_id INT NOT NULL,
            total DECIMAL(10, 2)
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_mysql_fetch_raw_schema() -> Result<()> {
    let mysql = Mysql::default().start().await.unwrap();
    let port = mysql.get_host_port_ipv4(3306).await.unwrap();
    let database_url = format!("mysql://root@localhost:{port}/test");

    wait_for_mysql_ready(&database_url, 30).await?;
    create_shop_tables(&database_url).await;

    let adapter = MySqlAdapter::new(&database_url).await?;
    adapter.test_connection().await?;
    let raw = adapter.fetch_raw_schema().await?;

    let names: Vec<_> = raw.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["orders", "users"]);

    let users = &raw.tables[1];
    let columns: Vec<_> = users.columns.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(columns, ["id", "name", "bio", "born", "created_at"]);
    assert_eq!(users.columns[1].1, "varchar(10)");
    assert_eq!(users.columns[2].1, "text");

    let orders = &raw.tables[0];
    assert_eq!(orders.columns[0].1, "bigint unsigned");
    assert_eq!(orders.columns[2].1, "decimal(10,2)");

    adapter.close().await;
    Ok(())
}

#[tokio::test]
async fn test_mysql_cache_then_sanitize() -> Result<()> {
    let mysql = Mysql::default().start().await.unwrap();
    let port = mysql.get_host_port_ipv4(3306).await.unwrap();
    let database_url = format!("mysql://root@localhost:{port}/test");

    wait_for_mysql_ready(&database_url, 30).await?;
    create_shop_tables(&database_url).await;

    let adapter = MySqlAdapter::new(&database_url).await?;
    let raw = adapter.fetch_raw_schema().await?;
    adapter.close().await;

    let cache = tempfile::tempdir().unwrap();
    let store = SchemaStore::file(cache.path());
    store.fetch_and_cache(adapter.database(), &raw)?;
    assert!(cache.path().join("test.json").exists());

    let sanitizer =
        Sanitizer::from_config("test", GuardConfig::default().with_cache_dir(cache.path()))?;

    let request = SanitizeRequest::new(
        "INSERT INTO orders (user_id, total) VALUES (::user_id::, ::total::)",
        "orders",
    )
    .with_parameter("user_id", "7")
    .with_parameter("total", "19.99");
    let query = sanitizer.sanitize(&request)?;
    assert_eq!(
        query.as_str(),
        "INSERT INTO orders (user_id, total) VALUES (7, 19.99)"
    );

    let rejected = SanitizeRequest::new("SELECT * FROM users WHERE born = '::born::'", "users")
        .with_parameter("born", "2023-02-29");
    assert!(matches!(
        sanitizer.sanitize(&rejected),
        Err(SqlGuardError::Validation { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_mysql_introspection_session_is_read_only() -> Result<()> {
    let mysql = Mysql::default().start().await.unwrap();
    let port = mysql.get_host_port_ipv4(3306).await.unwrap();
    let database_url = format!("mysql://root@localhost:{port}/test");

    wait_for_mysql_ready(&database_url, 30).await?;
    create_shop_tables(&database_url).await;

    let adapter = MySqlAdapter::new(&database_url).await?;
    let write = sqlx::query("INSERT INTO orders (user_id, total) VALUES (1, 1.00)")
        .execute(&adapter.pool)
        .await;
    assert!(write.is_err(), "introspection session must refuse writes");

    adapter.close().await;
    Ok(())
}
