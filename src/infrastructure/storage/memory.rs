use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entity::{Row, Value};
use crate::domain::repository::{FilterCondition, TableRef};
use thiserror::Error;

/// ストレージエラー
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Table {0} already exists")]
    TableAlreadyExists(String),

    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// テーブルのデータを保持する構造体
#[derive(Debug, Clone)]
struct TableData {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TableData {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    fn insert_row(&mut self, row: Row) {
        // 未知のカラムはスキーマに追加する
        for name in row.values.keys() {
            if !self.columns.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                self.columns.push(name.clone());
            }
        }
        self.rows.push(row);
    }

    fn filter_rows(&self, filter: &FilterCondition) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| Self::eval_filter(row, filter))
            .collect()
    }

    fn eval_filter(row: &Row, filter: &FilterCondition) -> bool {
        match filter {
            FilterCondition::Equals { column, value } => match row.get_ignore_case(column) {
                Some(Value::Null) | None => false,
                Some(row_value) => row_value == value,
            },
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::eval_filter(row, c))
            }
        }
    }
}

/// インメモリストレージの実装
///
/// テーブルは `schema.name` を小文字化したキーで保持する。
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, TableData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn key(table: &TableRef) -> String {
        table.to_string().to_lowercase()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, TableData>>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Internal("storage lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, TableData>>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Internal("storage lock poisoned".to_string()))
    }

    /// テーブルを作成する
    pub fn create_table(
        &self,
        table: &TableRef,
        columns: Vec<String>,
        if_not_exists: bool,
    ) -> Result<(), StorageError> {
        let mut tables = self.write()?;
        let key = Self::key(table);

        if tables.contains_key(&key) {
            if if_not_exists {
                return Ok(());
            }
            return Err(StorageError::TableAlreadyExists(table.to_string()));
        }

        tables.insert(key, TableData::new(columns));
        Ok(())
    }

    /// テーブルが存在するか確認する
    pub fn table_exists(&self, table: &TableRef) -> Result<bool, StorageError> {
        Ok(self.read()?.contains_key(&Self::key(table)))
    }

    /// 複数行を挿入する
    pub fn insert_rows(&self, table: &TableRef, rows: Vec<Row>) -> Result<(), StorageError> {
        let mut tables = self.write()?;

        let table_data = tables
            .get_mut(&Self::key(table))
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        for row in rows {
            table_data.insert_row(row);
        }

        Ok(())
    }

    /// 条件に合う行を検索する
    pub fn select_rows(
        &self,
        table: &TableRef,
        filter: &FilterCondition,
    ) -> Result<(Vec<String>, Vec<Row>), StorageError> {
        let tables = self.read()?;

        let table_data = tables
            .get(&Self::key(table))
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        let rows = table_data.filter_rows(filter).into_iter().cloned().collect();

        Ok((table_data.columns.clone(), rows))
    }
}
