// Dump importer: ensures the schema, then replays statements on one session
use crate::config::{ExecutionMode, SchemaTarget};
use crate::error::ImportError;
use crate::executor::report::{ImportReport, RunInfo};
use crate::executor::session::SqlSession;
use crate::script::filter::{classify, Classification};
use crate::types::{ExecutableStatement, ExecutionOutcome, StatementCandidate};
use chrono::Utc;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Replays statement candidates against a single owned session.
pub struct DumpImporter<S: SqlSession> {
    session: S,
    mode: ExecutionMode,
}

impl<S: SqlSession> DumpImporter<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Ensure and select the target schema, replay every executable candidate in
    /// order and snapshot the resulting tables.
    ///
    /// Failing to create or select the schema aborts before any statement runs.
    /// Statement failures are recorded in the report; in best-effort mode the
    /// run continues past them. A failed table listing is recorded in the report too.
    pub async fn execute(
        &mut self,
        candidates: &[StatementCandidate],
        target: &SchemaTarget,
    ) -> Result<ImportReport, ImportError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("import", run_id = %run_id, schema = %target.name);
        self.run(candidates, target, run_id).instrument(span).await
    }

    /// Close the underlying session.
    pub async fn close(self) -> Result<(), ImportError> {
        self.session.close().await?;
        Ok(())
    }

    async fn run(
        &mut self,
        candidates: &[StatementCandidate],
        target: &SchemaTarget,
        run_id: Uuid,
    ) -> Result<ImportReport, ImportError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        self.prepare_schema(target).await?;

        let mut skipped = 0;
        let mut statements = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match classify(candidate) {
                Classification::Skip(reason) => {
                    debug!(ordinal = candidate.ordinal, reason = %reason, "Skipping statement");
                    skipped += 1;
                }
                Classification::Execute => statements.push(ExecutableStatement::from(candidate)),
            }
        }
        info!(
            executable = statements.len(),
            skipped = skipped,
            mode = ?self.mode,
            "Replaying statements"
        );

        let replayed = match self.mode {
            ExecutionMode::BestEffort => Replayed::finished(self.replay_best_effort(&statements).await),
            ExecutionMode::Transactional => self.replay_transactional(&statements).await?,
        };

        // Statements have already run; a failed snapshot must not hide their outcomes.
        let (tables, tables_error) = match self.session.list_tables(&target.name).await {
            Ok(tables) => (tables, None),
            Err(e) => {
                warn!(error = %e, "Failed to list tables after import");
                (BTreeSet::new(), Some(e.to_string()))
            }
        };

        let mut report = ImportReport::build(replayed.outcomes, tables).with_skipped(skipped);
        if let Some(not_attempted) = replayed.not_attempted {
            report = report.with_rollback(not_attempted);
        }
        if let Some(error) = replayed.transaction_error {
            report = report.with_transaction_error(error);
        }
        if let Some(error) = tables_error {
            report = report.with_tables_error(error);
        }
        let report = report.with_run(RunInfo {
            run_id,
            schema: target.name.clone(),
            backend: self.session.backend(),
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
        });

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            tables = report.tables.len(),
            "Import finished: {}",
            report.summary()
        );
        Ok(report)
    }

    async fn prepare_schema(&mut self, target: &SchemaTarget) -> Result<(), ImportError> {
        self.session
            .create_schema_if_absent(target)
            .await
            .map_err(|e| ImportError::schema_setup(&target.name, e))?;
        info!(charset = %target.charset, collation = %target.collation, "Schema ensured");

        self.session
            .use_schema(&target.name)
            .await
            .map_err(|e| ImportError::schema_setup(&target.name, e))?;
        debug!("Schema selected");
        Ok(())
    }

    async fn run_statement(&mut self, statement: &ExecutableStatement) -> ExecutionOutcome {
        match self.session.execute(&statement.text).await {
            Ok(()) => ExecutionOutcome::Succeeded { ordinal: statement.ordinal },
            Err(e) => {
                warn!(ordinal = statement.ordinal, error = %e, "Statement failed");
                ExecutionOutcome::failed(statement, e.to_string())
            }
        }
    }

    async fn replay_best_effort(&mut self, statements: &[ExecutableStatement]) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(statements.len());
        for statement in statements {
            outcomes.push(self.run_statement(statement).await);
        }
        outcomes
    }

    /// Begin failing is fatal; once statements have run, commit and rollback
    /// failures are carried in the result next to the outcomes.
    async fn replay_transactional(&mut self, statements: &[ExecutableStatement]) -> Result<Replayed, ImportError> {
        self.session.begin().await?;

        let mut outcomes = Vec::with_capacity(statements.len());
        for (index, statement) in statements.iter().enumerate() {
            let outcome = self.run_statement(statement).await;
            let failed = !outcome.is_success();
            outcomes.push(outcome);
            if failed {
                let not_attempted = statements.len() - index - 1;
                warn!(ordinal = statement.ordinal, not_attempted = not_attempted, "Rolling back import");
                let transaction_error = match self.session.rollback().await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(error = %e, "Rollback failed");
                        Some(format!("rollback failed: {}", e))
                    }
                };
                return Ok(Replayed {
                    outcomes,
                    not_attempted: Some(not_attempted),
                    transaction_error,
                });
            }
        }

        match self.session.commit().await {
            Ok(()) => {
                debug!("Import transaction committed");
                Ok(Replayed::finished(outcomes))
            }
            Err(e) => {
                warn!(error = %e, "Commit failed");
                Ok(Replayed {
                    outcomes,
                    not_attempted: None,
                    transaction_error: Some(format!("commit failed: {}", e)),
                })
            }
        }
    }
}

/// What a replay produced, before the table snapshot is taken.
struct Replayed {
    outcomes: Vec<ExecutionOutcome>,
    /// Set when a transactional run rolled back
    not_attempted: Option<usize>,
    transaction_error: Option<String>,
}

impl Replayed {
    fn finished(outcomes: Vec<ExecutionOutcome>) -> Self {
        Self { outcomes, not_attempted: None, transaction_error: None }
    }
}
