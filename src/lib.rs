pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod script;
pub mod types;

pub use config::{ConnectionConfig, ExecutionMode, ExecutionOptions, ImportConfig, SchemaTarget, SplitMode};
pub use error::{DatabaseError, ImportError, InputError};
pub use executor::{DumpImporter, ImportReport, SqlSession};
pub use pipeline::{plan_dump, replay, run_import};
pub use types::{Backend, ExecutableStatement, ExecutionOutcome, RawScript, StatementCandidate};
