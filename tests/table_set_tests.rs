//! Table set behaviour against an in-memory executor
//!
//! Every statement is recorded so the tests can check exactly what would
//! have been sent to the database, in what order, and what was not sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pg_fixtures::{row, ExecError, Executor, FixtureError, Statement, Table, TableSet, Value};

#[derive(Default)]
struct RecordingExecutor {
    statements: Mutex<Vec<Statement>>,
    /// Statements whose SQL starts with this prefix fail.
    fail_prefix: Option<String>,
}

impl RecordingExecutor {
    fn failing_on(prefix: &str) -> Self {
        Self {
            fail_prefix: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    fn sql(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<(), ExecError> {
        self.statements
            .lock()
            .unwrap()
            .push(Statement::with_args(sql, args.to_vec()));

        match &self.fail_prefix {
            Some(prefix) if sql.starts_with(prefix.as_str()) => {
                Err(ExecError::other(format!("relation rejected: {}", sql)))
            }
            _ => Ok(()),
        }
    }
}

fn users() -> Table {
    Table::new("users", ["id", "name", "email"])
        .with_keys(["id"])
        .with_rows([
            row!["myid", "Elon", "elon@test.ts"],
            row!["myid2", "Donald", "donald@test.ts"],
        ])
}

fn memberships() -> Table {
    Table::new("memberships", ["user_id", "team", "role"])
        .with_keys(["user_id", "team"])
        .with_rows([
            row!["myid", "rockets", "lead"],
            row!["myid2", "rockets", Option::<&str>::None],
        ])
}

fn teams() -> Table {
    Table::new("teams", ["name"])
        .with_keys(["name"])
        .with_row(row!["rockets"])
}

#[tokio::test]
async fn test_setup_inserts_tables_in_declared_order() {
    let set = TableSet::new(RecordingExecutor::default(), vec![users(), teams(), memberships()]);

    set.setup().await.unwrap();

    assert_eq!(
        set.executor().sql(),
        vec![
            "INSERT INTO users (id, name, email) VALUES($1, $2, $3);",
            "INSERT INTO users (id, name, email) VALUES($1, $2, $3);",
            "INSERT INTO teams (name) VALUES($1);",
            "INSERT INTO memberships (user_id, team, role) VALUES($1, $2, $3);",
            "INSERT INTO memberships (user_id, team, role) VALUES($1, $2, $3);",
        ]
    );

    let statements = set.executor().statements.lock().unwrap();
    assert_eq!(statements[4].args, row!["myid2", "rockets", Value::Null]);
}

#[tokio::test]
async fn test_setup_aborts_on_first_failing_table() {
    let set = TableSet::new(
        RecordingExecutor::failing_on("INSERT INTO teams"),
        vec![users(), teams(), memberships()],
    );

    let err = set.setup().await.unwrap_err();

    match &err {
        FixtureError::Table { table, source } => {
            assert_eq!(table, "teams");
            assert!(matches!(**source, FixtureError::Insert { row: 0, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!set
        .executor()
        .sql()
        .iter()
        .any(|sql| sql.contains("memberships")));
}

#[tokio::test]
async fn test_setup_stops_at_malformed_row() {
    let broken = users().with_row(row!["myid3", "Ada"]).with_row(row!["myid4", "Bob", "bob@test.ts"]);
    let set = TableSet::new(RecordingExecutor::default(), vec![broken, teams()]);

    let err = set.setup().await.unwrap_err();

    assert!(err.is_shape_error());
    assert_eq!(
        err.to_string(),
        "table users: columns and rows[2] of table users must have the same length: expected 3, got 2"
    );
    assert_eq!(set.executor().sql().len(), 2);
}

#[tokio::test]
async fn test_teardown_is_one_statement() {
    let set = TableSet::new(RecordingExecutor::default(), vec![users(), teams(), memberships()]);

    set.teardown().await.unwrap();

    assert_eq!(
        set.executor().sql(),
        vec!["TRUNCATE users,teams,memberships CASCADE;"]
    );
}

#[tokio::test]
async fn test_teardown_without_cascade() {
    let set = TableSet::new(RecordingExecutor::default(), vec![users()]).with_cascade(false);

    set.teardown().await.unwrap();

    assert_eq!(set.executor().sql(), vec!["TRUNCATE users;"]);
}

#[tokio::test]
async fn test_teardown_failure() {
    let set = TableSet::new(RecordingExecutor::failing_on("TRUNCATE"), vec![users(), teams()]);

    let err = set.teardown().await.unwrap_err();

    assert!(matches!(err, FixtureError::Truncate { .. }));
    assert!(err.to_string().starts_with("error truncating tables:"));
}

#[tokio::test]
async fn test_teardown_of_empty_set_is_rejected() {
    let set = TableSet::new(RecordingExecutor::default(), Vec::new());

    let err = set.teardown().await.unwrap_err();

    assert!(matches!(err, FixtureError::NoTables));
    assert!(set.executor().sql().is_empty());
}

#[tokio::test]
async fn test_cleanup_issues_one_delete_per_table() {
    let set = TableSet::new(RecordingExecutor::default(), vec![users(), memberships()]);

    set.cleanup().await.unwrap();

    let statements = set.executor().statements.lock().unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].sql, "DELETE FROM users WHERE id=$1 OR id=$2;");
    assert_eq!(
        statements[1].sql,
        "DELETE FROM memberships WHERE (user_id=$1 AND team=$2) OR (user_id=$3 AND team=$4);"
    );
    assert_eq!(
        statements[1].args,
        row!["myid", "rockets", "myid2", "rockets"]
    );
}

#[tokio::test]
async fn test_cleanup_stops_at_table_without_keys() {
    let keyless = Table::new("audit_log", ["id", "message"]).with_row(row![1, "created"]);
    let set = TableSet::new(RecordingExecutor::default(), vec![users(), keyless, teams()]);

    let err = set.cleanup().await.unwrap_err();

    assert!(err.is_config_error());
    assert_eq!(
        err.to_string(),
        "table audit_log: table audit_log must have at least one key"
    );
    assert_eq!(
        set.executor().sql(),
        vec!["DELETE FROM users WHERE id=$1 OR id=$2;"]
    );
}

#[tokio::test]
async fn test_cleanup_failure_names_table() {
    let set = TableSet::new(
        RecordingExecutor::failing_on("DELETE FROM teams"),
        vec![teams(), users()],
    );

    let err = set.cleanup().await.unwrap_err();

    assert!(err.to_string().starts_with("table teams: exec query for teams:"));
    assert_eq!(set.executor().sql().len(), 1);
}

#[tokio::test]
async fn test_pushed_tables_join_the_set() {
    let mut set = TableSet::new(RecordingExecutor::default(), vec![users()]);
    set.push(teams());

    set.setup().await.unwrap();
    set.teardown().await.unwrap();

    let (executor, tables) = set.into_parts();
    assert_eq!(
        tables.iter().map(Table::name).collect::<Vec<_>>(),
        vec!["users", "teams"]
    );
    assert_eq!(
        executor.sql().last().map(String::as_str),
        Some("TRUNCATE users,teams CASCADE;")
    );
    assert_eq!(executor.sql().len(), 4);
}

#[tokio::test]
async fn test_shared_executor_handle() {
    let shared = Arc::new(RecordingExecutor::default());
    let first = TableSet::new(Arc::clone(&shared), vec![users()]);
    let second = TableSet::new(Arc::clone(&shared), vec![teams()]);

    first.setup().await.unwrap();
    second.teardown().await.unwrap();

    assert_eq!(shared.sql().len(), 3);
    assert_eq!(shared.sql()[2], "TRUNCATE teams CASCADE;");
}

#[tokio::test]
async fn test_dyn_executor() {
    let executor: Box<dyn Executor> = Box::new(RecordingExecutor::default());
    let set = TableSet::new(executor, vec![teams()]);

    set.setup().await.unwrap();
    set.cleanup().await.unwrap();
}
