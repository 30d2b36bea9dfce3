mod database;
pub use database::{
    identifier::{Identifier, IdentifierError, MAX_IDENTIFIER_BYTES},
    memory::{MemoryStore, MemoryTable},
    postgres::{
        client::{PostgresClient, PostgresConnectionError},
        config::{ConnectionConfigError, ConnectionSettings},
        setup::{setup_postgres, SetupPostgresError},
    },
    store::{ColumnDefinition, ColumnType, DocumentStore, StoreError},
};

mod loader;
pub use loader::{
    parse_batch, read_batch_from_input, read_batch_from_path, value_to_text, BatchSummary,
    InputError, LoadError, LoaderSession, Record, DEFAULT_TABLE,
};

mod logger;
pub use logger::{setup_info_logger, setup_logger};

mod start;
pub use start::{
    load_from_input, start_loader, InputSource, LoadFromInputError, LoadOutcome, StartDetails,
    StartLoaderError,
};

// export 3rd party dependencies
pub use async_trait::async_trait;
