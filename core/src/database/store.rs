use std::collections::HashSet;

use async_trait::async_trait;

use crate::database::identifier::Identifier;

/// Column types the loader knows how to create.
///
/// Every field is stored as text. A typed column would be a new variant here plus a matching
/// arm in [`ColumnType::sql_type`]; values are always bound as text today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Text,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: Identifier,
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    pub fn text(name: Identifier) -> Self {
        ColumnDefinition { name, column_type: ColumnType::Text }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("PgError {0}")]
    PgError(#[from] tokio_postgres::Error),

    #[error("Table {0} does not exist")]
    TableNotFound(String),

    #[error("Column {column} of table {table} does not exist")]
    ColumnNotFound { table: String, column: String },

    #[error("Column {column} of table {table} already exists")]
    ColumnAlreadyExists { table: String, column: String },

    #[error("A transaction is already in progress")]
    TransactionAlreadyStarted,

    #[error("There is no transaction in progress")]
    NoTransaction,

    #[error("The connection has already been closed")]
    ConnectionClosed,
}

/// The statements the loader needs from a database.
///
/// Every call happens on the same connection, in order. Between `begin` and `commit` the
/// schema changes and inserts are part of one unit of work which `rollback` discards.
#[async_trait]
pub trait DocumentStore: Send {
    async fn begin(&mut self) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    async fn drop_table_if_exists(&mut self, table: &Identifier) -> Result<(), StoreError>;

    async fn create_table_if_not_exists(
        &mut self,
        table: &Identifier,
        columns: &[ColumnDefinition],
    ) -> Result<(), StoreError>;

    /// Names of the columns the table currently has, empty if the table does not exist.
    async fn column_names(&mut self, table: &Identifier) -> Result<HashSet<String>, StoreError>;

    async fn add_column(
        &mut self,
        table: &Identifier,
        column: &ColumnDefinition,
    ) -> Result<(), StoreError>;

    /// Inserts one row; `values[i]` goes into `columns[i]`, `None` is SQL NULL.
    async fn insert_row(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Option<String>],
    ) -> Result<u64, StoreError>;

    /// Releases the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), StoreError>;
}
