// fixtures/table.rs - One table's fixture rows
//
// `Table` is plain data. Binding it to an executor gives a `BoundTable`,
// which is the only thing that can actually run statements.

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};
use crate::executor::Executor;
use crate::statement::{self, InsertTemplate, Statement};
use crate::value::Value;

/// The rows to seed into one table, plus the columns that identify them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Sets the columns used by `cleanup` to find the inserted rows.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.rows.extend(rows);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn insert_template(&self) -> InsertTemplate {
        InsertTemplate::new(&self.name, &self.columns)
    }

    pub fn truncate_statement(&self, cascade: bool) -> Statement {
        Statement::new(statement::truncate_sql(&self.name, cascade))
    }

    /// The DELETE that removes exactly this table's rows, matched on its keys.
    pub fn cleanup_statement(&self) -> FixtureResult<Statement> {
        statement::delete_by_keys(&self.name, &self.columns, &self.keys, &self.rows)
    }

    /// Attaches an executor. The table is borrowed, never modified.
    pub fn bind<'a, E>(&'a self, executor: &'a E) -> BoundTable<'a, E>
    where
        E: Executor + ?Sized,
    {
        BoundTable {
            table: self,
            executor,
            cascade: true,
        }
    }
}

/// A table paired with the executor that runs its statements.
pub struct BoundTable<'a, E: ?Sized> {
    table: &'a Table,
    executor: &'a E,
    cascade: bool,
}

impl<'a, E> BoundTable<'a, E>
where
    E: Executor + ?Sized,
{
    /// Whether `teardown` truncates with `CASCADE` (the default).
    pub fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Inserts every row, one statement per row, in order.
    ///
    /// Stops at the first row that is malformed or fails to execute; later
    /// rows are not attempted.
    pub async fn setup(&self) -> FixtureResult<()> {
        let table = self.table;

        if table.columns.is_empty() {
            return Err(FixtureError::EmptyColumns {
                table: table.name.clone(),
            });
        }

        let template = table.insert_template();
        tracing::debug!("Prepared insert for {}: {}", table.name, template.sql());

        for (i, row) in table.rows.iter().enumerate() {
            let statement = template.bind(i, row)?;

            self.executor
                .execute_statement(&statement)
                .await
                .map_err(|source| FixtureError::Insert {
                    table: table.name.clone(),
                    row: i,
                    source,
                })?;
        }

        tracing::info!("Loaded {} rows into {}", table.rows.len(), table.name);
        Ok(())
    }

    /// Removes every row of this table, fixture or not.
    pub async fn teardown(&self) -> FixtureResult<()> {
        let statement = self.table.truncate_statement(self.cascade);
        tracing::debug!("Truncating {}: {}", self.table.name, statement.sql);

        self.executor
            .execute_statement(&statement)
            .await
            .map_err(|source| FixtureError::Exec {
                table: self.table.name.clone(),
                source,
            })
    }

    /// Deletes only the rows `setup` inserted, matched on the key columns.
    pub async fn cleanup(&self) -> FixtureResult<()> {
        let table = self.table;

        if table.keys.is_empty() {
            return Err(FixtureError::NoKeys {
                table: table.name.clone(),
            });
        }

        let statement = table.cleanup_statement()?;
        tracing::debug!(
            "Cleaning up {} ({} args): {}",
            table.name,
            statement.args.len(),
            statement.sql
        );

        self.executor
            .execute_statement(&statement)
            .await
            .map_err(|source| FixtureError::Exec {
                table: table.name.clone(),
                source,
            })?;

        tracing::info!("Removed {} fixture rows from {}", table.rows.len(), table.name);
        Ok(())
    }
}
