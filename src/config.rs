// config.rs - Database settings from the environment
//
// Reads `.env` first (if present), then:
//   DATABASE_URL                       required
//   PG_FIXTURES_MAX_CONNECTIONS        default 5
//   PG_FIXTURES_ACQUIRE_TIMEOUT_SECS   default 5
//   PG_FIXTURES_STATEMENT_TIMEOUT_MS   unset means no deadline

use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{FixtureError, FixtureResult};
use crate::postgres::PgExecutor;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS: &str = "PG_FIXTURES_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_SECS: &str = "PG_FIXTURES_ACQUIRE_TIMEOUT_SECS";
pub const STATEMENT_TIMEOUT_MS: &str = "PG_FIXTURES_STATEMENT_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: None,
        }
    }

    /// Loads `.env`, then reads the process environment.
    pub fn from_env() -> FixtureResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> FixtureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| FixtureError::Config(format!("{} must be set", DATABASE_URL)))?;

        let mut config = Self::new(database_url);

        if let Some(max) = parse_var::<u32>(&lookup, MAX_CONNECTIONS)? {
            if max == 0 {
                return Err(FixtureError::Config(format!(
                    "{} must be at least 1",
                    MAX_CONNECTIONS
                )));
            }
            config.max_connections = max;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ACQUIRE_TIMEOUT_SECS)? {
            config.acquire_timeout = Duration::from_secs(secs);
        }
        config.statement_timeout =
            parse_var::<u64>(&lookup, STATEMENT_TIMEOUT_MS)?.map(Duration::from_millis);

        Ok(config)
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Opens a connection pool with these settings.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.database_url)
            .await
    }

    /// Opens a pool and wraps it in an executor carrying the statement timeout.
    pub async fn executor(&self) -> Result<PgExecutor, sqlx::Error> {
        let pool = self.connect().await?;
        let executor = PgExecutor::new(pool);

        Ok(match self.statement_timeout {
            Some(timeout) => executor.with_statement_timeout(timeout),
            None => executor,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> FixtureResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| FixtureError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::from_lookup(lookup(&[(DATABASE_URL, "postgres://localhost/db")]))
            .unwrap();
        assert_eq!(config, DatabaseConfig::new("postgres://localhost/db"));
    }

    #[test]
    fn test_all_settings() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://localhost/db"),
            (MAX_CONNECTIONS, "12"),
            (ACQUIRE_TIMEOUT_SECS, "3"),
            (STATEMENT_TIMEOUT_MS, " 1500 "),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.statement_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_missing_url() {
        let err = DatabaseConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: DATABASE_URL must be set");
    }

    #[test]
    fn test_invalid_number() {
        let err = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://localhost/db"),
            (MAX_CONNECTIONS, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, FixtureError::Config(ref msg) if msg.starts_with(MAX_CONNECTIONS)));
    }

    #[test]
    fn test_zero_connections() {
        let err = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://localhost/db"),
            (MAX_CONNECTIONS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, FixtureError::Config(_)));
    }
}
