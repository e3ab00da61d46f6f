// MySQL / MariaDB session over a single mysql_async connection
use crate::config::{ConnectionConfig, SchemaTarget};
use crate::error::DatabaseError;
use crate::executor::session::SqlSession;
use crate::types::Backend;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub struct MySqlSession {
    conn: Conn,
}

impl MySqlSession {
    /// Connect without selecting a database; the importer selects it later.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DatabaseError> {
        info!(host = %config.host, port = config.port, user = %config.user, "Connecting to MySQL");

        let builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()));
        let conn = Conn::new(Opts::from(builder)).await?;

        info!(host = %config.host, port = config.port, "MySQL connection established");
        Ok(Self { conn })
    }
}

impl SqlSession for MySqlSession {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    async fn create_schema_if_absent(&mut self, target: &SchemaTarget) -> Result<(), DatabaseError> {
        let sql = format!(
            "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET {} COLLATE {}",
            Backend::MySql.quote_identifier(&target.name),
            target.charset,
            target.collation
        );
        debug!(sql = %sql, "Ensuring database");
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn use_schema(&mut self, name: &str) -> Result<(), DatabaseError> {
        let sql = format!("USE {}", Backend::MySql.quote_identifier(name));
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn list_tables(&mut self, schema: &str) -> Result<BTreeSet<String>, DatabaseError> {
        let sql = format!(
            "SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'",
            Backend::MySql.quote_identifier(schema)
        );
        let rows: Vec<(String, String)> = self.conn.query(sql).await?;
        Ok(rows.into_iter().map(|(name, _)| name).collect())
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        self.conn.query_drop("START TRANSACTION").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.conn.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.conn.query_drop("ROLLBACK").await?;
        Ok(())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        self.conn.disconnect().await?;
        debug!("MySQL connection closed");
        Ok(())
    }
}
