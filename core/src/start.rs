use std::{
    fs::File,
    io::{self, Read},
    path::PathBuf,
};

use tracing::{error, info, warn};

use crate::database::memory::{MemoryStore, MemoryTable};
use crate::database::postgres::config::ConnectionSettings;
use crate::database::postgres::setup::{setup_postgres, SetupPostgresError};
use crate::database::store::DocumentStore;
use crate::loader::{read_batch_from_input, BatchSummary, InputError, LoadError, LoaderSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    fn open(&self) -> Result<Box<dyn Read>, InputError> {
        match self {
            InputSource::Stdin => Ok(Box::new(io::stdin().lock())),
            InputSource::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

pub struct StartDetails {
    pub input: InputSource,
    pub table: String,
    pub connection: ConnectionSettings,
    /// Load into memory instead of postgres, nothing is written anywhere.
    pub dry_run: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum StartLoaderError {
    #[error("Could not setup postgres: {0}")]
    SetupPostgresError(#[from] SetupPostgresError),
}

#[derive(thiserror::Error, Debug)]
pub enum LoadFromInputError {
    #[error("Error reading data: {0}")]
    Input(#[from] InputError),

    #[error("Error inserting data: {0}")]
    Load(#[from] LoadError),
}

#[derive(Debug)]
pub enum LoadOutcome {
    NothingToLoad,
    Loaded {
        summary: BatchSummary,
        /// The resulting table, only available for dry runs.
        table: Option<MemoryTable>,
    },
    Failed(LoadFromInputError),
}

/// Reads one payload and loads it into `table`, then closes the session's connection.
///
/// The connection is closed whatever happened before; errors from the read, parse or insert
/// steps are logged and returned, a failure to close is only logged.
pub async fn load_from_input<S, R>(
    session: &mut LoaderSession<S>,
    reader: R,
    table: &str,
) -> Result<Option<BatchSummary>, LoadFromInputError>
where
    S: DocumentStore,
    R: Read,
{
    async fn _load<S: DocumentStore, R: Read>(
        session: &mut LoaderSession<S>,
        reader: R,
        table: &str,
    ) -> Result<Option<BatchSummary>, LoadFromInputError> {
        match read_batch_from_input(reader)? {
            Some(records) => Ok(Some(session.insert_batch(&records, table).await?)),
            None => Ok(None),
        }
    }

    let result = _load(session, reader, table).await;
    if let Err(e) = &result {
        error!("Error reading or inserting data: {}", e);
    }

    if let Err(e) = session.close().await {
        warn!("Error closing connection: {}", e);
    }

    result
}

async fn run<S: DocumentStore>(
    store: S,
    input: &InputSource,
    table: &str,
) -> (LoaderSession<S>, Result<Option<BatchSummary>, LoadFromInputError>) {
    let mut session = LoaderSession::new(store);
    let result = match input.open() {
        Ok(reader) => load_from_input(&mut session, reader, table).await,
        Err(e) => {
            error!("Error reading or inserting data: {}", e);
            if let Err(close_error) = session.close().await {
                warn!("Error closing connection: {}", close_error);
            }
            Err(e.into())
        }
    };
    (session, result)
}

/// Connects, loads the input once and disconnects.
///
/// Only a failure to connect is an `Err`, anything after that is reported in the outcome.
pub async fn start_loader(details: StartDetails) -> Result<LoadOutcome, StartLoaderError> {
    let (result, table) = if details.dry_run {
        info!("Dry run, loading into memory");
        let (session, result) = run(MemoryStore::new(), &details.input, &details.table).await;
        let table = session.store().table(&details.table).cloned();
        (result, table)
    } else {
        let client = setup_postgres(&details.connection).await?;
        let (_, result) = run(client, &details.input, &details.table).await;
        (result, None)
    };

    Ok(match result {
        Ok(Some(summary)) => LoadOutcome::Loaded { summary, table },
        Ok(None) => LoadOutcome::NothingToLoad,
        Err(e) => LoadOutcome::Failed(e),
    })
}
