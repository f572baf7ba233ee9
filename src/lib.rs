// lib.rs - Root module for the pg_fixtures library
//
// Fixture rows go in before a test and come out afterwards. The pure SQL
// builders live in `statement`; `fixtures` binds them to an `Executor`.

pub mod error;
pub mod executor;
/// Table definitions, table sets and JSON fixture files
pub mod fixtures;
pub mod statement;
pub mod value;

#[cfg(feature = "db-tools")]
pub mod config;
#[cfg(feature = "db-tools")]
pub mod postgres;

pub use error::{ExecError, FixtureError, FixtureResult};
pub use executor::Executor;
pub use fixtures::{BoundTable, Table, TableSet};
pub use statement::Statement;
pub use value::Value;
