// Run configuration, resolved by the caller and handed to the pipeline
use crate::error::ImportError;
use crate::types::Backend;
use std::fmt;
use std::time::Duration;

/// Where and how to connect. The credential is never printed.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database to connect to before the target schema exists (PostgreSQL only)
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// Local defaults for a backend: `root` on `localhost` with an empty password.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            host: "localhost".to_string(),
            port: backend.default_port(),
            user: "root".to_string(),
            password: String::new(),
            database: None,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// The schema the dump is replayed into, with the encoding used to create it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTarget {
    pub name: String,
    pub charset: String,
    pub collation: String,
}

impl SchemaTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charset: "utf8".to_string(),
            collation: "utf8_general_ci".to_string(),
        }
    }
}

/// How the dump is cut into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Split on every `;`, ignoring quotes and comments
    #[default]
    Naive,
    /// Split on top-level `;` tokens only
    Lexical,
}

/// What happens when a statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Record the failure and keep going; nothing is rolled back
    #[default]
    BestEffort,
    /// Run everything in one transaction and roll back on the first failure
    Transactional,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub split_mode: SplitMode,
    pub execution_mode: ExecutionMode,
    /// Upper bound on the whole run, connection included
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub connection: ConnectionConfig,
    pub schema: SchemaTarget,
    pub options: ExecutionOptions,
}

impl ImportConfig {
    pub fn new(connection: ConnectionConfig, schema: SchemaTarget) -> Self {
        Self {
            connection,
            schema,
            options: ExecutionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.schema.name.trim().is_empty() {
            return Err(ImportError::configuration("schema", "schema name must not be empty"));
        }
        if self.schema.name.contains('\0') {
            return Err(ImportError::configuration("schema", "schema name must not contain NUL"));
        }
        for (key, value) in [("charset", &self.schema.charset), ("collation", &self.schema.collation)] {
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ImportError::configuration(key, format!("invalid {}: '{}'", key, value)));
            }
        }
        if self.connection.host.trim().is_empty() {
            return Err(ImportError::configuration("host", "host must not be empty"));
        }
        if self.options.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ImportError::configuration("timeout", "timeout must be greater than zero"));
        }
        Ok(())
    }
}
