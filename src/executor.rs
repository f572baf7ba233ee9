// executor.rs - The one capability fixtures need from a database
//
// Run a statement with positional arguments and report success or failure.
// No rows come back and no transaction is assumed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::statement::Statement;
use crate::value::Value;

/// Executes parameterized statements against a database.
///
/// Dropping the returned future cancels the statement; the caller sees the
/// cancellation as the failure of whatever fixture operation was running.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError>;

    async fn execute_statement(&self, statement: &Statement) -> Result<(), ExecError> {
        self.execute(&statement.sql, &statement.args).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for &E {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError> {
        (**self).execute(sql, args).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError> {
        (**self).execute(sql, args).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError> {
        (**self).execute(sql, args).await
    }
}
