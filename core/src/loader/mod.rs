//! The dynamic table loader.
//!
//! A [`LoaderSession`] owns the store connection and remembers whether it has already dropped
//! the target table. The first batch of a session starts from an empty table; later batches
//! append to it, growing its columns as new field names show up.

mod input;
mod record;

pub use input::{parse_batch, read_batch_from_input, read_batch_from_path, InputError};
pub use record::{value_to_text, Record};

use std::collections::HashSet;

use tracing::{debug, error, info};

use crate::database::identifier::{Identifier, IdentifierError};
use crate::database::store::{ColumnDefinition, DocumentStore, StoreError};

pub const DEFAULT_TABLE: &str = "documents";

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(IdentifierError),

    #[error("Invalid field name in row {row}: {source}")]
    InvalidFieldName { row: usize, source: IdentifierError },

    #[error("Error starting transaction: {0}")]
    Begin(StoreError),

    #[error("Error dropping table {table}: {source}")]
    DropTable { table: String, source: StoreError },

    #[error("Error creating table {table}: {source}")]
    CreateTable { table: String, source: StoreError },

    #[error("Error reading the columns of table {table}: {source}")]
    ReadColumns { table: String, source: StoreError },

    #[error("Error adding column {column} to table {table}: {source}")]
    AddColumn { table: String, column: String, source: StoreError },

    #[error("Error inserting row {row} into table {table}: {source}")]
    InsertRow { table: String, row: usize, source: StoreError },

    #[error("Error committing batch into table {table}: {source}")]
    Commit { table: String, source: StoreError },
}

/// What a successful [`LoaderSession::insert_batch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub table: String,
    pub table_dropped: bool,
    /// Columns added with `ALTER TABLE` to a table that already existed. Columns made by the
    /// batch's own `CREATE TABLE` are not listed, so this is empty after a first batch.
    pub columns_added: Vec<String>,
    pub rows_inserted: u64,
}

/// A record whose field names have been validated, in the order they will be inserted.
struct PreparedRow {
    columns: Vec<Identifier>,
    values: Vec<Option<String>>,
}

fn prepare_rows(records: &[Record]) -> Result<(Vec<PreparedRow>, Vec<Identifier>), LoadError> {
    let mut rows = Vec::with_capacity(records.len());
    let mut union = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let mut columns = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len());

        for (name, value) in record.fields() {
            let identifier = Identifier::new(name)
                .map_err(|source| LoadError::InvalidFieldName { row: index, source })?;
            if seen.insert(identifier.clone()) {
                union.push(identifier.clone());
            }
            columns.push(identifier);
            values.push(value.map(str::to_string));
        }

        rows.push(PreparedRow { columns, values });
    }

    Ok((rows, union))
}

pub struct LoaderSession<S: DocumentStore> {
    store: S,
    table_dropped: bool,
}

impl<S: DocumentStore> LoaderSession<S> {
    pub fn new(store: S) -> Self {
        LoaderSession { store, table_dropped: false }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether this session has already dropped its target table.
    pub fn table_dropped(&self) -> bool {
        self.table_dropped
    }

    /// Adds a `TEXT` column for every field the table does not have yet.
    ///
    /// Returns the columns that were added, so an empty result means the table already had
    /// them all. Existing columns and their data are never touched.
    pub async fn ensure_columns(
        &mut self,
        table: &Identifier,
        fields: &[Identifier],
    ) -> Result<Vec<Identifier>, LoadError> {
        let mut existing = self.store.column_names(table).await.map_err(|source| {
            error!("Error reading columns of {}: {}", table, source);
            LoadError::ReadColumns { table: table.to_string(), source }
        })?;

        let mut added = Vec::new();
        for field in fields {
            if existing.contains(field.as_str()) {
                continue;
            }

            info!("Adding column {} to {}", field, table);
            self.store.add_column(table, &ColumnDefinition::text(field.clone())).await.map_err(
                |source| {
                    error!("Error adding column {} to {}: {}", field, table, source);
                    LoadError::AddColumn {
                        table: table.to_string(),
                        column: field.to_string(),
                        source,
                    }
                },
            )?;
            existing.insert(field.to_string());
            added.push(field.clone());
        }

        Ok(added)
    }

    /// Loads `records` into `table` as one transaction.
    ///
    /// On the first call of the session the table is dropped first. Any failure rolls the
    /// whole batch back and later rows are not attempted. The drop flag stays set even then,
    /// so a failed first batch does not make a later batch drop the table.
    pub async fn insert_batch(
        &mut self,
        records: &[Record],
        table: &str,
    ) -> Result<BatchSummary, LoadError> {
        let table = Identifier::new(table).map_err(LoadError::InvalidTableName)?;
        let (rows, union) = prepare_rows(records)?;

        self.store.begin().await.map_err(|source| {
            error!("Error starting transaction: {}", source);
            LoadError::Begin(source)
        })?;

        let summary = match self.apply_batch(&table, &rows, &union).await {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(rollback_error) = self.store.rollback().await {
                    error!("Error rolling back batch for {}: {}", table, rollback_error);
                }
                return Err(e);
            }
        };

        self.store.commit().await.map_err(|source| {
            error!("Error committing batch for {}: {}", table, source);
            LoadError::Commit { table: table.to_string(), source }
        })?;
        info!("Committed {} rows into {}", summary.rows_inserted, table);

        Ok(summary)
    }

    /// Loads already parsed documents into the default `documents` table.
    pub async fn insert_documents(
        &mut self,
        records: &[Record],
    ) -> Result<BatchSummary, LoadError> {
        self.insert_batch(records, DEFAULT_TABLE).await
    }

    pub async fn close(&mut self) -> Result<(), StoreError> {
        self.store.close().await
    }

    async fn apply_batch(
        &mut self,
        table: &Identifier,
        rows: &[PreparedRow],
        union: &[Identifier],
    ) -> Result<BatchSummary, LoadError> {
        let mut table_dropped = false;
        if !self.table_dropped {
            info!("Dropping table {} if exists...", table);
            self.store.drop_table_if_exists(table).await.map_err(|source| {
                error!("Error dropping table {}: {}", table, source);
                LoadError::DropTable { table: table.to_string(), source }
            })?;
            info!("Table {} dropped (or did not exist)", table);
            self.table_dropped = true;
            table_dropped = true;
        }

        let columns: Vec<ColumnDefinition> =
            union.iter().cloned().map(ColumnDefinition::text).collect();
        info!("Creating table {} if not exists...", table);
        self.store.create_table_if_not_exists(table, &columns).await.map_err(|source| {
            error!("Error creating table {}: {}", table, source);
            LoadError::CreateTable { table: table.to_string(), source }
        })?;
        info!("Table {} created or already exists", table);

        // The table may predate this batch, so the union is not necessarily there yet
        let mut columns_added = self.ensure_columns(table, union).await?;

        let mut rows_inserted = 0;
        for (index, row) in rows.iter().enumerate() {
            columns_added.extend(self.ensure_columns(table, &row.columns).await?);

            info!("Inserting row {} into {}", index, table);
            debug!("Row {}: {:?}", index, row.values);
            rows_inserted += self
                .store
                .insert_row(table, &row.columns, &row.values)
                .await
                .map_err(|source| {
                    error!("Error inserting row {} into {}: {}", index, table, source);
                    LoadError::InsertRow { table: table.to_string(), row: index, source }
                })?;
        }

        Ok(BatchSummary {
            table: table.to_string(),
            table_dropped,
            columns_added: columns_added.iter().map(Identifier::to_string).collect(),
            rows_inserted,
        })
    }
}
