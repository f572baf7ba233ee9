// fixtures/file.rs - Table definitions from JSON
//
// A fixture file holds either one table object or `{"tables": [...]}`:
//
//   {
//     "tables": [
//       {"name": "users", "columns": ["id", "name"], "keys": ["id"],
//        "rows": [["u1", "Elon"], ["u2", "Donald"]]}
//     ]
//   }
//
// Row shapes are not checked here; setup and cleanup do that.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::FixtureResult;
use crate::fixtures::table::Table;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDocument {
    tables: Vec<Table>,
}

/// Parses a fixture document into its tables, in file order.
pub fn parse_tables(input: &str) -> FixtureResult<Vec<Table>> {
    let document: serde_json::Value = serde_json::from_str(input)?;

    if document.get("tables").is_some() {
        let document: FixtureDocument = serde_json::from_value(document)?;
        Ok(document.tables)
    } else {
        Ok(vec![serde_json::from_value(document)?])
    }
}

/// Reads and parses a fixture file.
pub fn load_tables(path: impl AsRef<Path>) -> FixtureResult<Vec<Table>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let tables = parse_tables(&contents)?;
    tracing::debug!("Loaded {} tables from {}", tables.len(), path.display());
    Ok(tables)
}
