use std::sync::Arc;
use async_trait::async_trait;

use crate::domain::entity::RowSet;
use crate::domain::repository::{SourceRepository, RepositoryError, FilterCondition, TableRef};
use crate::infrastructure::storage::{MemoryStorage, StorageError};

/// インメモリリポジトリの実装
pub struct MemorySourceRepository {
    storage: Arc<MemoryStorage>,
}

impl MemorySourceRepository {
    pub fn new(storage: Arc<MemoryStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SourceRepository for MemorySourceRepository {
    async fn select(
        &self,
        table: &TableRef,
        filter: &FilterCondition,
    ) -> Result<RowSet, RepositoryError> {
        let (columns, rows) = self.storage.select_rows(table, filter)?;

        let mut result = RowSet::new(table.name.clone(), columns);
        for row in rows {
            result.add_row(row);
        }

        Ok(result)
    }
}

impl From<StorageError> for RepositoryError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::TableNotFound(name) => {
                RepositoryError::Query(format!("Table '{}' does not exist", name))
            }
            StorageError::TableAlreadyExists(name) => {
                RepositoryError::StorageError(format!("Table {} already exists", name))
            }
            StorageError::Internal(msg) => RepositoryError::InternalError(msg),
        }
    }
}
