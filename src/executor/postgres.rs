// PostgreSQL session over a single tokio-postgres client
use crate::config::{ConnectionConfig, SchemaTarget};
use crate::error::DatabaseError;
use crate::executor::session::SqlSession;
use crate::types::Backend;
use std::collections::BTreeSet;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

pub struct PostgresSession {
    client: Client,
    connection: JoinHandle<()>,
}

impl PostgresSession {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DatabaseError> {
        let database = config.database.as_deref().unwrap_or("postgres");
        info!(host = %config.host, port = config.port, user = %config.user, database = %database, "Connecting to PostgreSQL");

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .dbname(database);
        if !config.password.is_empty() {
            pg_config.password(&config.password);
        }

        let (client, connection) = pg_config.connect(NoTls).await?;

        // Spawn connection task
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        info!(host = %config.host, port = config.port, "PostgreSQL connection established");
        Ok(Self { client, connection })
    }
}

impl SqlSession for PostgresSession {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn create_schema_if_absent(&mut self, target: &SchemaTarget) -> Result<(), DatabaseError> {
        // Encoding is fixed per database in PostgreSQL, not per schema.
        debug!(charset = %target.charset, "Ignoring charset for PostgreSQL schema");
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            Backend::Postgres.quote_identifier(&target.name)
        );
        self.client.batch_execute(&sql).await?;
        Ok(())
    }

    async fn use_schema(&mut self, name: &str) -> Result<(), DatabaseError> {
        let sql = format!("SET search_path TO {}", Backend::Postgres.quote_identifier(name));
        self.client.batch_execute(&sql).await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn list_tables(&mut self, schema: &str) -> Result<BTreeSet<String>, DatabaseError> {
        let rows = self
            .client
            .query(
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_type = 'BASE TABLE'",
                &[&schema],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    async fn begin(&mut self) -> Result<(), DatabaseError> {
        self.client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn close(self) -> Result<(), DatabaseError> {
        // Dropping the client ends the connection task.
        drop(self.client);
        if let Err(e) = self.connection.await {
            return Err(DatabaseError::server(format!("PostgreSQL connection task failed: {}", e)));
        }
        debug!("PostgreSQL connection closed");
        Ok(())
    }
}
