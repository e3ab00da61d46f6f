// Import report: aggregated outcome of one run
use crate::types::{Backend, ExecutionOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Identity and timing of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub schema: String,
    pub backend: Backend,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Candidates dropped by the statement filter
    pub skipped: usize,
    /// Executable statements never attempted after a transactional rollback
    pub not_attempted: usize,
    pub rolled_back: bool,
    /// Failure messages in encounter order
    pub failures: Vec<String>,
    /// Tables present in the target schema after the run
    pub tables: BTreeSet<String>,
    /// Why the table snapshot is missing, when listing tables failed
    pub tables_error: Option<String>,
    /// Commit or rollback failure in transactional mode
    pub transaction_error: Option<String>,
    pub outcomes: Vec<ExecutionOutcome>,
    pub run: Option<RunInfo>,
}

impl ImportReport {
    /// Aggregate statement outcomes and the post-import table snapshot.
    pub fn build(outcomes: Vec<ExecutionOutcome>, tables: BTreeSet<String>) -> Self {
        let failures: Vec<String> = outcomes
            .iter()
            .filter_map(ExecutionOutcome::failure_message)
            .collect();
        Self {
            succeeded: outcomes.len() - failures.len(),
            failed: failures.len(),
            failures,
            tables,
            outcomes,
            ..Default::default()
        }
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn with_rollback(mut self, not_attempted: usize) -> Self {
        self.rolled_back = true;
        self.not_attempted = not_attempted;
        self
    }

    pub fn with_tables_error(mut self, error: impl Into<String>) -> Self {
        self.tables_error = Some(error.into());
        self
    }

    pub fn with_transaction_error(mut self, error: impl Into<String>) -> Self {
        self.transaction_error = Some(error.into());
        self
    }

    pub fn with_run(mut self, run: RunInfo) -> Self {
        self.run = Some(run);
        self
    }

    /// Whether every executed statement succeeded and the run wrapped up cleanly.
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && !self.rolled_back && self.tables_error.is_none() && self.transaction_error.is_none()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} succeeded, {} failed, {} skipped, {} tables",
            self.succeeded,
            self.failed,
            self.skipped,
            self.tables.len()
        );
        if self.rolled_back {
            summary.push_str(&format!(" (rolled back, {} not attempted)", self.not_attempted));
        }
        if self.tables_error.is_some() {
            summary.push_str(" (table list unavailable)");
        }
        if self.transaction_error.is_some() {
            summary.push_str(" (transaction not finished cleanly)");
        }
        summary
    }
}
