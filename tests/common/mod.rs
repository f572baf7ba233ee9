// common/mod.rs - Shared helpers for the PostgreSQL integration tests
//
// Each test gets its own schema so tests can run concurrently against one
// database. Tables are addressed as `<schema>.<table>` instead of relying on
// search_path, which is per connection and would not follow the pool.

#![allow(dead_code)]

use std::future::Future;

use pg_fixtures::config::DatabaseConfig;
use pg_fixtures::postgres::PgExecutor;
use sqlx::PgPool;

/// Executor over a pool built from DATABASE_URL (and `.env`).
pub async fn create_test_executor() -> anyhow::Result<PgExecutor> {
    let config = DatabaseConfig::from_env()?;
    Ok(config.executor().await?)
}

/// Generate a schema name for a test: `test_` plus the sanitized test name.
pub fn generate_test_schema_name(test_name: &str) -> String {
    let sanitized: String = test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_lowercase() } else { '_' })
        .take(50)
        .collect();

    format!("fixtures_test_{}", sanitized)
}

pub async fn drop_schema(pool: &PgPool, schema: &str) -> anyhow::Result<()> {
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
        .execute(pool)
        .await?;
    Ok(())
}

/// Creates a fresh schema, runs `ddl` in it (`{schema}` is substituted),
/// hands the executor and schema name to the test, then drops the schema
/// whether or not the test passed.
pub async fn with_test_schema<F, Fut>(test_name: &str, ddl: &[&str], test_fn: F) -> anyhow::Result<()>
where
    F: FnOnce(PgExecutor, String) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let executor = create_test_executor().await?;
    let pool = executor.pool().clone();
    let schema = generate_test_schema_name(test_name);

    drop_schema(&pool, &schema).await?;
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&pool)
        .await?;

    for statement in ddl {
        sqlx::query(&statement.replace("{schema}", &schema))
            .execute(&pool)
            .await?;
    }

    let result = test_fn(executor, schema.clone()).await;

    drop_schema(&pool, &schema).await?;

    result
}

pub async fn count_rows(pool: &PgPool, table: &str) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}
