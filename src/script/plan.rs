// Offline dry run: split and classify without touching a database
use crate::config::SplitMode;
use crate::error::InputError;
use crate::script::filter::{classify, Classification};
use crate::script::splitter::split_script;
use crate::types::{Backend, ExecutableStatement, RawScript};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStatement {
    pub ordinal: usize,
    pub preview: String,
    pub classification: Classification,
    #[serde(skip)]
    pub text: String,
}

/// Every candidate of a dump with the action the importer would take.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub statements: Vec<PlannedStatement>,
}

impl ImportPlan {
    pub fn executable_count(&self) -> usize {
        self.statements.iter().filter(|s| !s.classification.is_skip()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.statements.len() - self.executable_count()
    }

    /// The statements that would be sent to the database, in order.
    pub fn executable(&self) -> Vec<ExecutableStatement> {
        self.statements
            .iter()
            .filter(|s| !s.classification.is_skip())
            .map(|s| ExecutableStatement { ordinal: s.ordinal, text: s.text.clone() })
            .collect()
    }
}

pub fn plan(script: &RawScript, mode: SplitMode, backend: Backend) -> Result<ImportPlan, InputError> {
    let statements = split_script(script, mode, backend)?
        .into_iter()
        .map(|candidate| PlannedStatement {
            ordinal: candidate.ordinal,
            preview: candidate.preview(),
            classification: classify(&candidate),
            text: candidate.text,
        })
        .collect();
    Ok(ImportPlan { statements })
}
