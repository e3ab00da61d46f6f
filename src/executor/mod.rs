// Import executor: database sessions, statement replay and reporting
pub mod importer;
pub mod mysql;
pub mod postgres;
pub mod report;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;


pub use importer::DumpImporter;
pub use mysql::MySqlSession;
pub use postgres::PostgresSession;
pub use report::{ImportReport, RunInfo};
pub use session::SqlSession;
