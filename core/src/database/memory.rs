//! An in-process [`DocumentStore`].
//!
//! Tables live in a map and a transaction is a snapshot of that map taken on `begin`, so a
//! rollback restores exactly what was there before. It backs `--dry-run` and the tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use crate::database::identifier::Identifier;
use crate::database::store::{ColumnDefinition, DocumentStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl MemoryTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// The value of `column` in row `index`, `None` when it is NULL or does not exist.
    pub fn value(&self, index: usize, column: &str) -> Option<&str> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows.get(index)?.get(position)?.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, MemoryTable>,
    snapshot: Option<HashMap<String, MemoryTable>>,
    drops_executed: usize,
    commits: usize,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    /// How many times a drop statement ran, whether or not a table was there to drop.
    pub fn drops_executed(&self) -> usize {
        self.drops_executed
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::ConnectionClosed);
        }
        Ok(())
    }

    fn table_mut(&mut self, table: &Identifier) -> Result<&mut MemoryTable, StoreError> {
        self.tables
            .get_mut(table.as_str())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn begin(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionAlreadyStarted);
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.tables = self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }

    async fn drop_table_if_exists(&mut self, table: &Identifier) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.drops_executed += 1;
        if self.tables.remove(table.as_str()).is_none() {
            debug!("Table {} did not exist", table);
        }
        Ok(())
    }

    async fn create_table_if_not_exists(
        &mut self,
        table: &Identifier,
        columns: &[ColumnDefinition],
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.tables.entry(table.to_string()).or_insert_with(|| MemoryTable {
            columns: columns.iter().map(|c| c.name.to_string()).collect(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn column_names(&mut self, table: &Identifier) -> Result<HashSet<String>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .tables
            .get(table.as_str())
            .map(|t| t.columns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_column(
        &mut self,
        table: &Identifier,
        column: &ColumnDefinition,
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let memory_table = self.table_mut(table)?;
        if memory_table.columns.iter().any(|c| c == column.name.as_str()) {
            return Err(StoreError::ColumnAlreadyExists {
                table: table.to_string(),
                column: column.name.to_string(),
            });
        }
        memory_table.columns.push(column.name.to_string());
        for row in memory_table.rows.iter_mut() {
            row.push(None);
        }
        Ok(())
    }

    async fn insert_row(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Option<String>],
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let memory_table = self.table_mut(table)?;

        let mut row = vec![None; memory_table.columns.len()];
        for (column, value) in columns.iter().zip(values) {
            let position = memory_table
                .columns
                .iter()
                .position(|c| c == column.as_str())
                .ok_or_else(|| StoreError::ColumnNotFound {
                    table: table.to_string(),
                    column: column.to_string(),
                })?;
            row[position] = value.clone();
        }
        memory_table.rows.push(row);

        Ok(1)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_add_column_backfills_null() {
        let mut store = MemoryStore::new();
        let table = ident("documents");
        store
            .create_table_if_not_exists(&table, &[ColumnDefinition::text(ident("a"))])
            .await
            .unwrap();
        store.insert_row(&table, &[ident("a")], &[Some("1".to_string())]).await.unwrap();

        store.add_column(&table, &ColumnDefinition::text(ident("b"))).await.unwrap();

        let memory_table = store.table("documents").unwrap();
        assert_eq!(memory_table.columns(), ["a", "b"]);
        assert_eq!(memory_table.value(0, "a"), Some("1"));
        assert_eq!(memory_table.value(0, "b"), None);
    }

    #[tokio::test]
    async fn test_add_existing_column_fails() {
        let mut store = MemoryStore::new();
        let table = ident("documents");
        store
            .create_table_if_not_exists(&table, &[ColumnDefinition::text(ident("a"))])
            .await
            .unwrap();

        let result = store.add_column(&table, &ColumnDefinition::text(ident("a"))).await;
        assert!(matches!(result, Err(StoreError::ColumnAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_create_if_not_exists_keeps_existing_table() {
        let mut store = MemoryStore::new();
        let table = ident("documents");
        store
            .create_table_if_not_exists(&table, &[ColumnDefinition::text(ident("a"))])
            .await
            .unwrap();
        store
            .create_table_if_not_exists(&table, &[ColumnDefinition::text(ident("z"))])
            .await
            .unwrap();

        assert_eq!(store.table("documents").unwrap().columns(), ["a"]);
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let mut store = MemoryStore::new();
        let table = ident("documents");
        store
            .create_table_if_not_exists(&table, &[ColumnDefinition::text(ident("a"))])
            .await
            .unwrap();

        store.begin().await.unwrap();
        store.insert_row(&table, &[ident("a")], &[Some("1".to_string())]).await.unwrap();
        store.drop_table_if_exists(&table).await.unwrap();
        assert!(store.table("documents").is_none());
        store.rollback().await.unwrap();

        let memory_table = store.table("documents").unwrap();
        assert!(memory_table.rows().is_empty());
        assert!(!store.in_transaction());
        assert_eq!(store.commits(), 0);
    }

    #[tokio::test]
    async fn test_insert_into_unknown_column_fails() {
        let mut store = MemoryStore::new();
        let table = ident("documents");
        store.create_table_if_not_exists(&table, &[]).await.unwrap();

        let result = store.insert_row(&table, &[ident("x")], &[None]).await;
        assert!(matches!(result, Err(StoreError::ColumnNotFound { .. })));
    }

    #[tokio::test]
    async fn test_closed_store_rejects_statements() {
        let mut store = MemoryStore::new();
        store.close().await.unwrap();
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.begin().await, Err(StoreError::ConnectionClosed)));
    }
}
