use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a sqlseed run. Every variant is fatal for the run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Connection error: {message}: {source}")]
    Connection {
        message: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Schema setup error for '{schema}': {source}")]
    SchemaSetup {
        schema: String,
        #[source]
        source: DatabaseError,
    },

    #[error("Configuration error ({key}): {message}")]
    Configuration { message: String, key: String },

    #[error("Import did not finish within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ImportError {
    pub fn connection(message: impl Into<String>, source: DatabaseError) -> Self {
        Self::Connection { message: message.into(), source }
    }

    pub fn schema_setup(schema: impl Into<String>, source: DatabaseError) -> Self {
        Self::SchemaSetup { schema: schema.into(), source }
    }

    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), key: key.into() }
    }
}

/// Problems with the dump resource. Raised before any connection is opened.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("dump file does not exist: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("dump file is empty: {}", .path.display())]
    Empty { path: PathBuf },

    #[error("failed to read dump file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to tokenize dump: {message}")]
    Tokenize { message: String },
}

/// An error reported by a database backend.
///
/// Displayed as the server's own message so per-statement failures stay readable.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("{0}")]
    MySql(#[from] mysql_async::Error),

    #[error("{}", describe_postgres(.0))]
    Postgres(#[from] tokio_postgres::Error),

    #[error("{message}")]
    Server { message: String },
}

impl DatabaseError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server { message: message.into() }
    }
}

// tokio_postgres only says "db error" in Display; the detail lives in DbError.
fn describe_postgres(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => format!("ERROR {}: {}", db.code().code(), db.message()),
        None => error.to_string(),
    }
}
