// statement.rs - SQL text and positional arguments for fixture rows
//
// Pure functions only: nothing here touches a connection. Every builder
// returns the SQL together with the arguments in placeholder order.

use std::collections::HashMap;

use crate::error::{FixtureError, FixtureResult};
use crate::value::Value;

/// A statement ready for an executor: SQL text plus its `$n` arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    /// A statement without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Renders `$1, $2, ..., $count`.
pub fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The INSERT shared by every row of one table.
///
/// Rows are inserted one statement at a time so a failure can be pinned to
/// the row index that caused it.
#[derive(Clone, Debug)]
pub struct InsertTemplate {
    table: String,
    width: usize,
    sql: String,
}

impl InsertTemplate {
    pub fn new(table: &str, columns: &[String]) -> Self {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES({});",
            table,
            columns.join(", "),
            placeholders(columns.len())
        );

        Self {
            table: table.to_string(),
            width: columns.len(),
            sql,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of placeholders, equal to the number of declared columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Pairs the template with one row, checking the row has one value per column.
    pub fn bind(&self, row_index: usize, row: &[Value]) -> FixtureResult<Statement> {
        check_row_width(&self.table, self.width, row_index, row)?;
        Ok(Statement::with_args(self.sql.clone(), row.to_vec()))
    }
}

/// Single-row INSERT for `table`.
pub fn build_insert(table: &str, columns: &[String], row: &[Value]) -> FixtureResult<Statement> {
    InsertTemplate::new(table, columns).bind(0, row)
}

/// `TRUNCATE a,b,c [CASCADE];` for one or more tables in a single round trip.
pub fn truncate<I, S>(tables: I, cascade: bool) -> FixtureResult<Statement>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = tables
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();

    if names.is_empty() {
        return Err(FixtureError::NoTables);
    }

    Ok(Statement::new(truncate_sql(&names.join(","), cascade)))
}

pub(crate) fn truncate_sql(tables: &str, cascade: bool) -> String {
    if cascade {
        format!("TRUNCATE {} CASCADE;", tables)
    } else {
        format!("TRUNCATE {};", tables)
    }
}

/// Column name to tuple position, built once per statement.
pub(crate) fn column_indexes(columns: &[String]) -> HashMap<&str, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| (column.as_str(), i))
        .collect()
}

/// Resolves every key to its column position, in key order.
pub(crate) fn resolve_keys<'k>(
    table: &str,
    columns: &[String],
    keys: &'k [String],
) -> FixtureResult<Vec<(&'k str, usize)>> {
    let indexes = column_indexes(columns);

    keys.iter()
        .map(|key| {
            indexes
                .get(key.as_str())
                .map(|&idx| (key.as_str(), idx))
                .ok_or_else(|| FixtureError::KeyNotFound {
                    table: table.to_string(),
                    key: key.clone(),
                })
        })
        .collect()
}

/// `DELETE FROM <table> WHERE ...;` matching exactly the given rows by key.
///
/// Placeholders run `$1..$(rows * keys)` across the whole statement in
/// row-major order. A row's group is parenthesized only when the statement
/// has several rows and several keys.
pub fn delete_by_keys(
    table: &str,
    columns: &[String],
    keys: &[String],
    rows: &[Vec<Value>],
) -> FixtureResult<Statement> {
    if keys.is_empty() {
        return Err(FixtureError::NoKeys {
            table: table.to_string(),
        });
    }

    let key_indexes = resolve_keys(table, columns, keys)?;

    if rows.is_empty() {
        return Err(FixtureError::NoRows {
            table: table.to_string(),
        });
    }

    let group = rows.len() > 1 && key_indexes.len() > 1;

    let (predicates, args, _) = rows.iter().enumerate().try_fold(
        (
            Vec::<String>::with_capacity(rows.len()),
            Vec::<Value>::with_capacity(rows.len() * key_indexes.len()),
            1usize,
        ),
        |(mut predicates, mut args, next), (row_index, row)| {
            check_row_width(table, columns.len(), row_index, row)?;

            let (pairs, next) = key_indexes.iter().fold(
                (Vec::<String>::with_capacity(key_indexes.len()), next),
                |(mut pairs, n), &(key, idx)| {
                    pairs.push(format!("{}=${}", key, n));
                    args.push(row[idx].clone());
                    (pairs, n + 1)
                },
            );

            let joined = pairs.join(" AND ");
            predicates.push(if group {
                format!("({})", joined)
            } else {
                joined
            });

            Ok::<_, FixtureError>((predicates, args, next))
        },
    )?;

    let sql = format!("DELETE FROM {} WHERE {};", table, predicates.join(" OR "));
    Ok(Statement::with_args(sql, args))
}

fn check_row_width(table: &str, width: usize, row_index: usize, row: &[Value]) -> FixtureResult<()> {
    if row.len() != width {
        return Err(FixtureError::LengthMismatch {
            table: table.to_string(),
            row: row_index,
            expected: width,
            actual: row.len(),
        });
    }
    Ok(())
}
