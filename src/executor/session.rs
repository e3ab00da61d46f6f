// Database session seam used by the importer
use crate::config::SchemaTarget;
use crate::error::DatabaseError;
use crate::types::Backend;
use std::collections::BTreeSet;

/// One exclusively owned connection to a database server.
///
/// Implementations run every call on the same underlying connection so that
/// schema selection and transactions persist between calls.
#[allow(async_fn_in_trait)]
pub trait SqlSession {
    fn backend(&self) -> Backend;

    /// Create the schema unless it already exists. Must succeed when it does.
    async fn create_schema_if_absent(&mut self, target: &SchemaTarget) -> Result<(), DatabaseError>;

    /// Make `name` the schema unqualified statements resolve against.
    async fn use_schema(&mut self, name: &str) -> Result<(), DatabaseError>;

    /// Run a single statement, discarding any rows it returns.
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Names of the base tables currently in `schema`.
    async fn list_tables(&mut self, schema: &str) -> Result<BTreeSet<String>, DatabaseError>;

    async fn begin(&mut self) -> Result<(), DatabaseError>;

    async fn commit(&mut self) -> Result<(), DatabaseError>;

    async fn rollback(&mut self) -> Result<(), DatabaseError>;

    /// Close the connection gracefully.
    async fn close(self) -> Result<(), DatabaseError>
    where
        Self: Sized;
}
