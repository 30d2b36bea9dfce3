use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::{task, task::JoinHandle, time::timeout};
use tokio_postgres::types::ToSql;
use tokio_postgres::{config::SslMode, Client, Config, Error as PgError, Row, ToStatement};
use tracing::{debug, error, info};

use crate::database::identifier::Identifier;
use crate::database::postgres::config::{ConnectionConfigError, ConnectionSettings};
use crate::database::postgres::generate::{
    add_column_sql, create_table_sql, drop_table_sql, insert_row_sql, COLUMN_NAMES_SQL,
};
use crate::database::store::{ColumnDefinition, DocumentStore, StoreError};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(thiserror::Error, Debug)]
pub enum PostgresConnectionError {
    #[error("The database connection settings are wrong please check your environment: {0}")]
    DatabaseConnectionConfigWrong(#[from] ConnectionConfigError),

    #[error(
        "Can not connect to the database please make sure your connection settings are correct"
    )]
    CanNotConnectToDatabase,

    #[error("Could not create tls connector")]
    CouldNotCreateTlsConnector,
}

/// A single postgres connection, opened once and kept for the life of the loader.
pub struct PostgresClient {
    client: Option<Client>,
    connection_handle: Option<JoinHandle<Result<(), PgError>>>,
}

impl PostgresClient {
    pub async fn new(settings: &ConnectionSettings) -> Result<Self, PostgresConnectionError> {
        async fn _new(
            settings: &ConnectionSettings,
            disable_ssl: bool,
        ) -> Result<PostgresClient, PostgresConnectionError> {
            let mut config: Config = settings.to_config()?;

            if disable_ssl {
                config.ssl_mode(SslMode::Disable);
            }

            let connector = TlsConnector::builder()
                .build()
                .map_err(|_| PostgresConnectionError::CouldNotCreateTlsConnector)?;
            let tls_connector = MakeTlsConnector::new(connector);

            let (client, connection) =
                match timeout(CONNECT_TIMEOUT, config.connect(tls_connector)).await {
                    Ok(Ok((client, connection))) => (client, connection),
                    Ok(Err(e)) => {
                        // retry without ssl if ssl has been attempted and failed
                        if !disable_ssl &&
                            config.get_ssl_mode() != SslMode::Disable &&
                            !settings.requires_ssl()
                        {
                            return Box::pin(_new(settings, true)).await;
                        }
                        error!("Error connecting to database: {}", e);
                        return Err(PostgresConnectionError::CanNotConnectToDatabase);
                    }
                    Err(e) => {
                        error!("Timeout connecting to database: {}", e);
                        return Err(PostgresConnectionError::CanNotConnectToDatabase);
                    }
                };

            // The connection future drives the socket, it resolves once the client is dropped
            let connection_handle = task::spawn(connection);

            Ok(PostgresClient { client: Some(client), connection_handle: Some(connection_handle) })
        }

        info!("Connecting to {}", settings.redacted());
        _new(settings, false).await
    }

    fn client(&self) -> Result<&Client, StoreError> {
        self.client.as_ref().ok_or(StoreError::ConnectionClosed)
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<(), StoreError> {
        debug!("{}", sql);
        self.client()?.batch_execute(sql).await.map_err(StoreError::PgError)
    }

    pub async fn execute<T>(
        &self,
        query: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, StoreError>
    where
        T: ?Sized + ToStatement,
    {
        self.client()?.execute(query, params).await.map_err(StoreError::PgError)
    }

    pub async fn query<T>(
        &self,
        query: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, StoreError>
    where
        T: ?Sized + ToStatement,
    {
        self.client()?.query(query, params).await.map_err(StoreError::PgError)
    }
}

// `tokio_postgres::Transaction` borrows the client for its whole life, which a trait with
// separate begin and commit calls can not express, so the transaction is driven by hand
#[async_trait]
impl DocumentStore for PostgresClient {
    async fn begin(&mut self) -> Result<(), StoreError> {
        self.batch_execute("BEGIN;").await
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.batch_execute("COMMIT;").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.batch_execute("ROLLBACK;").await
    }

    async fn drop_table_if_exists(&mut self, table: &Identifier) -> Result<(), StoreError> {
        self.batch_execute(&drop_table_sql(table)).await
    }

    async fn create_table_if_not_exists(
        &mut self,
        table: &Identifier,
        columns: &[ColumnDefinition],
    ) -> Result<(), StoreError> {
        self.batch_execute(&create_table_sql(table, columns)).await
    }

    async fn column_names(&mut self, table: &Identifier) -> Result<HashSet<String>, StoreError> {
        let rows = self.query(COLUMN_NAMES_SQL, &[&table.as_str()]).await?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    async fn add_column(
        &mut self,
        table: &Identifier,
        column: &ColumnDefinition,
    ) -> Result<(), StoreError> {
        self.batch_execute(&add_column_sql(table, column)).await
    }

    async fn insert_row(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Option<String>],
    ) -> Result<u64, StoreError> {
        let sql = insert_row_sql(table, columns);
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|value| value as &(dyn ToSql + Sync)).collect();

        self.execute(sql.as_str(), &params).await
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        // Dropping the client ends the connection future
        drop(self.client.take());

        if let Some(connection_handle) = self.connection_handle.take() {
            match connection_handle.await {
                Ok(Ok(())) => info!("Database connection closed"),
                Ok(Err(e)) => {
                    error!("Database connection ended with an error: {}", e);
                    return Err(StoreError::PgError(e));
                }
                Err(e) => error!("Database connection task failed: {}", e),
            }
        }

        Ok(())
    }
}
