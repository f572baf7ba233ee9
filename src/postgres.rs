// postgres.rs - Executor backed by a sqlx PostgreSQL pool
//
// Typed values bind with their own SQL type. Text is different: fixture files
// only produce strings, so a text argument takes whatever type the server
// infers for its placeholder (uuid, date, numeric, ...) and is parsed into
// that type before binding.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::encode::IsNull;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgQueryResult, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Executor as _, PgPool, Postgres, TypeInfo};
use uuid::Uuid;

use crate::error::ExecError;
use crate::executor::Executor;
use crate::value::Value;

/// Runs fixture statements on a pool, one at a time.
#[derive(Clone, Debug)]
pub struct PgExecutor {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Fails any statement still running after `timeout` with `ExecError::Timeout`.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_value<'q>(
        query: Query<'q, Postgres, PgArguments>,
        value: &'q Value,
    ) -> Query<'q, Postgres, PgArguments> {
        match value {
            Value::Null => query.bind(UntypedNull),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Bytes(v) => query.bind(v.as_slice()),
            Value::Uuid(v) => query.bind(*v),
            Value::Date(v) => query.bind(*v),
            Value::Timestamp(v) => query.bind(*v),
            Value::TimestampTz(v) => query.bind(*v),
            Value::Decimal(v) => query.bind(*v),
            Value::Json(v) => query.bind(v),
        }
    }

    /// Replaces each text argument with its value parsed as the parameter
    /// type the server infers. `None` when there is nothing to convert.
    async fn coerce_text_args(
        &self,
        sql: &str,
        args: &[Value],
    ) -> Result<Option<Vec<Value>>, ExecError> {
        if !args.iter().any(|arg| matches!(arg, Value::Text(_))) {
            return Ok(None);
        }

        // Unnamed statement: does not land in the connection's statement cache.
        let described = self.pool.describe(sql).await?;
        let types = match described.parameters().and_then(|params| params.left()) {
            Some(types) => types,
            None => return Ok(None),
        };

        args.iter()
            .enumerate()
            .map(|(i, arg)| match (arg, types.get(i)) {
                (Value::Text(text), Some(ty)) => text_as(ty.name(), text)
                    .map_err(|reason| ExecError::other(format!("parameter ${}: {}", i + 1, reason))),
                _ => Ok(arg.clone()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<PgQueryResult, ExecError> {
        let coerced = self.coerce_text_args(sql, args).await?;
        let args = coerced.as_deref().unwrap_or(args);

        let mut query = sqlx::query(sql);
        for arg in args {
            query = Self::bind_value(query, arg);
        }

        Ok(query.execute(&self.pool).await?)
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError> {
        let result = match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(sql, args))
                .await
                .map_err(|_| ExecError::Timeout(limit))??,
            None => self.run(sql, args).await?,
        };

        tracing::trace!("{} affected {} rows", sql, result.rows_affected());
        Ok(())
    }
}

/// Parses `text` as the PostgreSQL type named `type_name` (sqlx spelling,
/// e.g. `INT4`). Types without a matching `Value` variant stay text.
fn text_as(type_name: &str, text: &str) -> Result<Value, String> {
    fn invalid(type_name: &str, text: &str, error: impl Display) -> String {
        format!("'{}' is not a valid {}: {}", text, type_name.to_lowercase(), error)
    }

    let value = match type_name {
        "UUID" => Value::Uuid(Uuid::parse_str(text).map_err(|e| invalid(type_name, text, e))?),
        "DATE" => Value::Date(
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| invalid(type_name, text, e))?,
        ),
        "TIMESTAMP" => Value::Timestamp(
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| text.parse::<NaiveDateTime>())
                .map_err(|e| invalid(type_name, text, e))?,
        ),
        "TIMESTAMPTZ" => Value::TimestampTz(
            text.parse::<DateTime<FixedOffset>>()
                .map_err(|e| invalid(type_name, text, e))?
                .with_timezone(&Utc),
        ),
        "NUMERIC" => Value::Decimal(
            text.parse::<Decimal>()
                .map_err(|e| invalid(type_name, text, e))?,
        ),
        "INT2" | "INT4" | "INT8" => Value::Int(
            text.trim()
                .parse::<i64>()
                .map_err(|e| invalid(type_name, text, e))?,
        ),
        "FLOAT4" | "FLOAT8" => Value::Float(
            text.trim()
                .parse::<f64>()
                .map_err(|e| invalid(type_name, text, e))?,
        ),
        "BOOL" => match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Value::Bool(true),
            "f" | "false" | "n" | "no" | "off" | "0" => Value::Bool(false),
            _ => return Err(invalid(type_name, text, "expected true or false")),
        },
        "JSON" | "JSONB" => Value::Json(
            serde_json::from_str(text).map_err(|e| invalid(type_name, text, e))?,
        ),
        _ => Value::Text(text.to_string()),
    };

    Ok(value)
}

/// A NULL parameter with no declared type, so the server infers it from the
/// column it lands in.
struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl sqlx::Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
        IsNull::Yes
    }
}
