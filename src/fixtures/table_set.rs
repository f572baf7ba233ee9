// fixtures/table_set.rs - Several fixture tables sharing one executor
//
// Setup and cleanup walk the tables one by one in declared order. Teardown
// is a single TRUNCATE naming all of them.

use crate::error::{FixtureError, FixtureResult};
use crate::executor::Executor;
use crate::fixtures::table::Table;
use crate::statement::{self, Statement};

/// An ordered batch of tables.
///
/// Order matters for `setup`: parents before children when foreign keys are
/// involved. Deletes and truncates do not depend on it.
pub struct TableSet<E> {
    executor: E,
    tables: Vec<Table>,
    cascade: bool,
}

impl<E> TableSet<E>
where
    E: Executor,
{
    pub fn new(executor: E, tables: Vec<Table>) -> Self {
        Self {
            executor,
            tables,
            cascade: true,
        }
    }

    /// Whether `teardown` truncates with `CASCADE` (the default).
    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_parts(self) -> (E, Vec<Table>) {
        (self.executor, self.tables)
    }

    /// The single statement `teardown` runs.
    pub fn truncate_statement(&self) -> FixtureResult<Statement> {
        statement::truncate(self.tables.iter().map(Table::name), self.cascade)
    }

    /// Seeds every table in declared order, stopping at the first failure.
    pub async fn setup(&self) -> FixtureResult<()> {
        for table in &self.tables {
            table
                .bind(&self.executor)
                .setup()
                .await
                .map_err(|e| e.in_table(table.name()))?;
        }

        tracing::info!("Fixture setup complete for {} tables", self.tables.len());
        Ok(())
    }

    /// Empties every table with one TRUNCATE.
    pub async fn teardown(&self) -> FixtureResult<()> {
        let statement = self.truncate_statement()?;
        tracing::debug!("Truncating fixture tables: {}", statement.sql);

        self.executor
            .execute_statement(&statement)
            .await
            .map_err(|source| FixtureError::Truncate { source })?;

        tracing::info!("Truncated {} fixture tables", self.tables.len());
        Ok(())
    }

    /// Deletes each table's fixture rows by key, one DELETE per table.
    pub async fn cleanup(&self) -> FixtureResult<()> {
        for table in &self.tables {
            table
                .bind(&self.executor)
                .cleanup()
                .await
                .map_err(|e| e.in_table(table.name()))?;
        }

        Ok(())
    }
}
