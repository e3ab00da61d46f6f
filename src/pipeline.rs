// End-to-end run: load the dump, connect, replay and always close the session
use crate::config::{ImportConfig, SplitMode};
use crate::error::{DatabaseError, ImportError};
use crate::executor::{DumpImporter, ImportReport, MySqlSession, PostgresSession, SqlSession};
use crate::script::{load_dump, plan, split_script, ImportPlan};
use crate::types::{Backend, StatementCandidate};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

/// Point in time by which the whole run must be done.
#[derive(Debug, Clone, Copy)]
struct RunDeadline {
    at: Instant,
    budget: Duration,
}

impl RunDeadline {
    fn starting_now(budget: Option<Duration>) -> Option<Self> {
        budget.map(|budget| Self { at: Instant::now() + budget, budget })
    }
}

async fn within<T>(deadline: Option<RunDeadline>, work: impl Future<Output = T>) -> Result<T, ImportError> {
    match deadline {
        Some(deadline) => timeout_at(deadline.at, work)
            .await
            .map_err(|_| ImportError::Timeout { seconds: deadline.budget.as_secs() }),
        None => Ok(work.await),
    }
}

/// Import the dump at `dump_path` as described by `config`.
///
/// Input problems are reported before any connection is attempted.
pub async fn run_import(config: &ImportConfig, dump_path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
    config.validate()?;

    let script = load_dump(dump_path).await?;
    let backend = config.connection.backend;
    let candidates = split_script(&script, config.options.split_mode, backend)?;
    info!(candidates = candidates.len(), split_mode = ?config.options.split_mode, "Dump split into statements");

    let deadline = RunDeadline::starting_now(config.options.deadline);
    let connection = &config.connection;
    match backend {
        Backend::MySql => {
            let session = connect(deadline, config, MySqlSession::connect(connection)).await?;
            replay_within(session, &candidates, config, deadline).await
        }
        Backend::Postgres => {
            let session = connect(deadline, config, PostgresSession::connect(connection)).await?;
            replay_within(session, &candidates, config, deadline).await
        }
    }
}

/// Replay already split candidates on an open session, then close it.
pub async fn replay<S: SqlSession>(
    session: S,
    candidates: &[StatementCandidate],
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let deadline = RunDeadline::starting_now(config.options.deadline);
    replay_within(session, candidates, config, deadline).await
}

/// Split and classify a dump without connecting anywhere.
pub async fn plan_dump(
    dump_path: impl AsRef<Path>,
    split_mode: SplitMode,
    backend: Backend,
) -> Result<ImportPlan, ImportError> {
    let script = load_dump(dump_path).await?;
    Ok(plan(&script, split_mode, backend)?)
}

async fn connect<S>(
    deadline: Option<RunDeadline>,
    config: &ImportConfig,
    connecting: impl Future<Output = Result<S, DatabaseError>>,
) -> Result<S, ImportError> {
    let connection = &config.connection;
    within(deadline, connecting).await?.map_err(|e| {
        ImportError::connection(
            format!("cannot connect to {} at {}:{}", connection.backend, connection.host, connection.port),
            e,
        )
    })
}

async fn replay_within<S: SqlSession>(
    session: S,
    candidates: &[StatementCandidate],
    config: &ImportConfig,
    deadline: Option<RunDeadline>,
) -> Result<ImportReport, ImportError> {
    let mut importer = DumpImporter::new(session).with_mode(config.options.execution_mode);
    let outcome = within(deadline, importer.execute(candidates, &config.schema))
        .await
        .and_then(|result| result);

    // The session is released on every path, including fatal errors.
    let closed = importer.close().await;
    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(report), Err(e)) => {
            warn!(error = %e, "Failed to close database session cleanly");
            Ok(report)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            warn!(error = %close_error, "Failed to close database session after error");
            Err(e)
        }
    }
}
