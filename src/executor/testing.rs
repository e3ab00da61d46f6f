// In-memory session used by unit tests
use crate::config::SchemaTarget;
use crate::error::DatabaseError;
use crate::executor::session::SqlSession;
use crate::types::Backend;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared record of every call a [`FakeSession`] received, readable after the
/// session has been consumed by `close`.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

/// A tiny MySQL-flavoured server: knows schemas, tables and their column
/// counts, and rejects what a real server would reject for simple statements.
#[derive(Default)]
pub(crate) struct FakeSession {
    pub(crate) journal: Journal,
    pub(crate) schemas: BTreeSet<String>,
    /// table name -> column count, for the selected schema
    pub(crate) tables: BTreeMap<String, usize>,
    pub(crate) fail_schema_setup: bool,
    pub(crate) fail_list_tables: bool,
    pub(crate) fail_commit: bool,
    pub(crate) fail_rollback: bool,
    /// Statements containing the needle fail with the message
    pub(crate) rejects: Vec<(String, String)>,
    pub(crate) statement_delay: Option<Duration>,
    snapshot: Option<BTreeMap<String, usize>>,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_schema(mut self, name: &str) -> Self {
        self.schemas.insert(name.to_string());
        self
    }

    pub(crate) fn rejecting(mut self, needle: &str, message: &str) -> Self {
        self.rejects.push((needle.to_string(), message.to_string()));
        self
    }

    fn apply(&mut self, sql: &str) -> Result<(), DatabaseError> {
        if let Some((_, message)) = self.rejects.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            return Err(DatabaseError::server(message.clone()));
        }

        let upper = sql.to_ascii_uppercase();
        if let Some(rest) = upper.strip_prefix("CREATE TABLE ") {
            let (rest, if_not_exists) = match rest.strip_prefix("IF NOT EXISTS ") {
                Some(rest) => (rest, true),
                None => (rest, false),
            };
            let name = object_name(rest);
            if self.tables.contains_key(&name) {
                if if_not_exists {
                    return Ok(());
                }
                return Err(DatabaseError::server(format!("Table '{}' already exists", name)));
            }
            self.tables.insert(name, list_len(sql));
            return Ok(());
        }
        if let Some(rest) = upper.strip_prefix("INSERT INTO ") {
            let name = object_name(rest);
            let Some(columns) = self.tables.get(&name) else {
                return Err(DatabaseError::server(format!("Table '{}' doesn't exist", name)));
            };
            if *columns != list_len(sql) {
                return Err(DatabaseError::server("Column count doesn't match value count at row 1"));
            }
            return Ok(());
        }
        if upper.starts_with("SELECT") || upper.starts_with("SET ") {
            return Ok(());
        }
        Err(DatabaseError::server("You have an error in your SQL syntax"))
    }
}

// Table names are compared case-insensitively.
fn object_name(rest: &str) -> String {
    rest.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .trim_matches('`')
        .to_ascii_lowercase()
}

// Number of comma separated entries in the first parenthesised list.
fn list_len(sql: &str) -> usize {
    match (sql.find('('), sql.rfind(')')) {
        (Some(open), Some(close)) if open < close => sql[open + 1..close].split(',').count(),
        _ => 0,
    }
}

impl SqlSession for FakeSession {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    async fn create_schema_if_absent(&mut self, target: &SchemaTarget) -> Result<(), DatabaseError> {
        self.journal.push(format!("create_schema {}", target.name));
        if self.fail_schema_setup {
            return Err(DatabaseError::server("Access denied for user 'root'@'localhost'"));
        }
        self.schemas.insert(target.name.clone());
        Ok(())
    }

    async fn use_schema(&mut self, name: &str) -> Result<(), DatabaseError> {
        self.journal.push(format!("use {}", name));
        if !self.schemas.contains(name) {
            return Err(DatabaseError::server(format!("Unknown database '{}'", name)));
        }
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.journal.push(format!("execute {}", sql));
        if let Some(delay) = self.statement_delay {
            tokio::time::sleep(delay).await;
        }
        self.apply(sql)
    }

    async fn list_tables(&mut self, _schema: &str) -> Result<BTreeSet<String>, DatabaseError> {
        self.journal.push("list_tables");
        if self.fail_list_tables {
            return Err(DatabaseError::server("SHOW TABLES denied"));
        }
        Ok(self.tables.keys().cloned().collect())
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        self.journal.push("begin");
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.journal.push("commit");
        if self.fail_commit {
            return Err(DatabaseError::server("Lost connection to MySQL server during query"));
        }
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.journal.push("rollback");
        if self.fail_rollback {
            return Err(DatabaseError::server("Lost connection to MySQL server during query"));
        }
        if let Some(tables) = self.snapshot.take() {
            self.tables = tables;
        }
        Ok(())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        self.journal.push("close");
        Ok(())
    }
}
