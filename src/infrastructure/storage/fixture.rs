use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::entity::{RowSet, TableError};
use crate::domain::repository::TableRef;
use crate::infrastructure::storage::{MemoryStorage, StorageError};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// フィクスチャファイルの形式
///
/// ```json
/// { "tables": { "SC.Order1": [ { "Email": "a@example.com", "OrderNumber": "A-1" } ] } }
/// ```
#[derive(Debug, Deserialize)]
struct Fixture {
    tables: serde_json::Map<String, serde_json::Value>,
}

/// `schema.table` 形式の名前を分解する
fn table_ref(qualified: &str) -> TableRef {
    match qualified.split_once('.') {
        Some((schema, name)) => TableRef::new(Some(schema), name),
        None => TableRef::new(None, qualified),
    }
}

/// JSON文字列からテーブルを読み込み、読み込んだテーブル数を返す
pub fn load_fixture_str(json: &str, storage: &MemoryStorage) -> Result<usize, FixtureError> {
    let fixture: Fixture = serde_json::from_str(json)?;

    for (qualified, rows) in &fixture.tables {
        let table = table_ref(qualified);
        let rows = rows.as_array().map(Vec::as_slice).unwrap_or_default();
        let row_set = RowSet::from_json_rows(table.name.clone(), rows)?;

        storage.create_table(&table, row_set.columns, true)?;
        storage.insert_rows(&table, row_set.rows)?;
        info!(table = %table, rows = rows.len(), "fixture table loaded");
    }

    Ok(fixture.tables.len())
}

/// フィクスチャファイルを読み込む
pub fn load_fixture(path: &Path, storage: &MemoryStorage) -> Result<usize, FixtureError> {
    let json = std::fs::read_to_string(path).map_err(|e| FixtureError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_fixture_str(&json, storage)
}
