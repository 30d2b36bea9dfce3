use tracing::info;

use crate::database::postgres::client::{PostgresClient, PostgresConnectionError};
use crate::database::postgres::config::ConnectionSettings;
use crate::database::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum SetupPostgresError {
    #[error("{0}")]
    PostgresConnection(#[from] PostgresConnectionError),

    #[error("Connected but the database did not answer a test query: {0}")]
    ConnectionCheck(StoreError),
}

/// Opens the loader's connection and makes sure the database actually answers.
pub async fn setup_postgres(
    settings: &ConnectionSettings,
) -> Result<PostgresClient, SetupPostgresError> {
    info!("Setting up postgres");
    let client = PostgresClient::new(settings).await?;

    client.batch_execute("SELECT 1;").await.map_err(SetupPostgresError::ConnectionCheck)?;
    info!("Connected to postgres");

    Ok(client)
}
