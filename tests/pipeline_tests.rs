use anyhow::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

use sqlseed::config::{ConnectionConfig, ExecutionMode, ExecutionOptions, ImportConfig, SchemaTarget, SplitMode};
use sqlseed::error::{DatabaseError, ImportError, InputError};
use sqlseed::script::{split, Classification, SkipReason};
use sqlseed::types::Backend;
use sqlseed::SqlSession;

/// Excerpt in the shape `mysqldump` and phpMyAdmin exports produce
const SAMPLE_DUMP: &str = r#"-- MySQL dump 10.13
SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT;
SET NAMES utf8mb4;
CREATE SCHEMA IF NOT EXISTS `db_brigadas` DEFAULT CHARACTER SET utf8;
USE `db_brigadas`;

CREATE TABLE IF NOT EXISTS `brigada` (
  `id_brigada` INT NOT NULL AUTO_INCREMENT,
  `nombre` VARCHAR(100) NOT NULL,
  PRIMARY KEY (`id_brigada`)
);

CREATE TABLE IF NOT EXISTS `usuario` (
  `id_usuario` INT NOT NULL AUTO_INCREMENT,
  `id_brigada` INT NULL,
  PRIMARY KEY (`id_usuario`),
  FOREIGN KEY (`id_brigada`) REFERENCES `brigada` (`id_brigada`)
);

INSERT INTO `brigada` (`nombre`) VALUES ('Norte'), ('Sur');
SET @OLD_SQL_MODE=@@SQL_MODE;
"#;

struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    fn new() -> Result<Self> {
        Ok(Self { dir: TempDir::new()? })
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

fn config() -> ImportConfig {
    ImportConfig::new(ConnectionConfig::new(Backend::MySql), SchemaTarget::new("db_brigadas"))
}

/// Accepts every statement and remembers what it saw.
#[derive(Default)]
struct RecordingSession {
    executed: Vec<String>,
    closed: std::rc::Rc<std::cell::Cell<bool>>,
}

impl SqlSession for RecordingSession {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    async fn create_schema_if_absent(&mut self, _target: &SchemaTarget) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn use_schema(&mut self, _name: &str) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        if sql.starts_with("DROP") {
            return Err(DatabaseError::server("DROP is not allowed here"));
        }
        self.executed.push(sql.to_string());
        Ok(())
    }

    async fn list_tables(&mut self, _schema: &str) -> Result<BTreeSet<String>, DatabaseError> {
        Ok(self
            .executed
            .iter()
            .filter_map(|sql| sql.strip_prefix("CREATE TABLE IF NOT EXISTS `"))
            .filter_map(|rest| rest.split('`').next())
            .map(str::to_string)
            .collect())
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        self.closed.set(true);
        Ok(())
    }
}

#[tokio::test]
async fn test_plan_of_sample_dump() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let path = workspace.write("dump.sql", SAMPLE_DUMP)?;

    let plan = sqlseed::plan_dump(&path, SplitMode::Naive, Backend::MySql).await?;

    let classifications: Vec<Classification> = plan.statements.iter().map(|s| s.classification).collect();
    assert_eq!(
        classifications,
        vec![
            Classification::Skip(SkipReason::Comment),
            Classification::Execute,
            Classification::Skip(SkipReason::CreateSchema),
            Classification::Skip(SkipReason::UseSchema),
            Classification::Execute,
            Classification::Execute,
            Classification::Execute,
            Classification::Skip(SkipReason::SessionVariable),
        ]
    );
    // The first SET @ shares a segment with the leading comment, so it is skipped with it.
    assert!(plan.statements[0].text.contains("SET @OLD_CHARACTER_SET_CLIENT"));
    assert_eq!(plan.executable_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_replay_sample_dump_through_public_api() -> Result<()> {
    let closed = std::rc::Rc::new(std::cell::Cell::new(false));
    let session = RecordingSession { closed: closed.clone(), ..Default::default() };

    let report = sqlseed::replay(session, &split(SAMPLE_DUMP), &config()).await?;

    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 4);
    let tables: Vec<&str> = report.tables.iter().map(String::as_str).collect();
    assert_eq!(tables, vec!["brigada", "usuario"]);
    assert!(closed.get());
    Ok(())
}

#[tokio::test]
async fn test_transactional_replay_reports_rollback() -> Result<()> {
    let config = config().with_options(ExecutionOptions {
        execution_mode: ExecutionMode::Transactional,
        ..Default::default()
    });

    let report = sqlseed::replay(
        RecordingSession::default(),
        &split("CREATE TABLE IF NOT EXISTS `a` (id INT); DROP TABLE a; SELECT 1; SELECT 2"),
        &config,
    )
    .await?;

    assert!(report.rolled_back);
    assert_eq!(report.not_attempted, 2);
    assert_eq!(report.failed, 1);
    assert!(report.failures[0].starts_with("DROP is not allowed here (Query: DROP TABLE a..."));
    Ok(())
}

#[tokio::test]
async fn test_empty_dump_is_input_error() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let path = workspace.write("empty.sql", "\n   \n")?;

    let err = sqlseed::run_import(&config(), &path).await.unwrap_err();
    assert!(matches!(err, ImportError::Input(InputError::Empty { .. })));
    Ok(())
}

#[tokio::test]
async fn test_unterminated_literal_fails_lexical_split_before_connecting() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let path = workspace.write("broken.sql", "INSERT INTO t VALUES ('never closed;")?;
    let config = config().with_options(ExecutionOptions {
        split_mode: SplitMode::Lexical,
        ..Default::default()
    });

    let err = sqlseed::run_import(&config, &path).await.unwrap_err();
    assert!(matches!(err, ImportError::Input(InputError::Tokenize { .. })));
    Ok(())
}
