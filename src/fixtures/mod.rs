// fixtures/mod.rs - Table fixtures and their lifecycle
//
// A fixture is a set of rows a test expects to find in the database. We
// describe them once as `Table` values, load them with `setup`, and take them
// out again with `cleanup` (only the rows we inserted) or `teardown`
// (everything in the table).
//
// Example:
//   let users = Table::new("users", ["id", "name", "email"])
//       .with_keys(["id"])
//       .with_row(row!["myid", "Elon", "elon@test.ts"]);
//   let set = TableSet::new(executor, vec![users]);
//   set.setup().await?;
//   // ... run the test ...
//   set.cleanup().await?;

pub mod file;
pub mod table;
pub mod table_set;

pub use file::{load_tables, parse_tables};
pub use table::{BoundTable, Table};
pub use table_set::TableSet;
