use async_trait::async_trait;
use std::fmt;

use crate::domain::entity::{RowSet, Value};

// 検索元リポジトリのエラー
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("{0}")]
    Query(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RepositoryError {
    /// クエリ自体の誤り（存在しないテーブル、不正なSQLなど）かどうか
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Query(_) | RepositoryError::InvalidIdentifier(_)
        )
    }
}

/// スキーマ修飾付きのテーブル名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// クエリフィルター条件
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// カラムの値が等しい（カラム名は大文字小文字を区別しない）
    Equals { column: String, value: Value },

    /// 複数条件のAND
    And(Vec<FilterCondition>),
}

impl FilterCondition {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterCondition::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    /// 条件に含まれるカラム名と値を出現順に列挙する
    pub fn terms(&self) -> Vec<(&str, &Value)> {
        match self {
            FilterCondition::Equals { column, value } => vec![(column.as_str(), value)],
            FilterCondition::And(conditions) => {
                conditions.iter().flat_map(FilterCondition::terms).collect()
            }
        }
    }
}

// 検索元リポジトリ - 検索対象テーブルから条件に合う行を取得するための抽象インターフェース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// 条件に合致する行をすべて取得する
    ///
    /// 返される行セットのソース識別子はスキーマを除いたテーブル名。
    async fn select(
        &self,
        table: &TableRef,
        filter: &FilterCondition,
    ) -> Result<RowSet, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ref_display_includes_schema() {
        assert_eq!(TableRef::new(Some("SC"), "Order1").to_string(), "SC.Order1");
        assert_eq!(TableRef::new(None, "Order1").to_string(), "Order1");
    }

    #[test]
    fn terms_flatten_nested_conditions() {
        let filter = FilterCondition::And(vec![
            FilterCondition::equals("Email", "a@example.com"),
            FilterCondition::And(vec![FilterCondition::equals("Phone", "555")]),
        ]);

        let terms = filter.terms();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[1].0, "Phone");
    }

    #[test]
    fn missing_table_counts_as_programming_error() {
        assert!(RepositoryError::Query("no such table".into()).is_programming_error());
        assert!(!RepositoryError::Connection("refused".into()).is_programming_error());
    }
}
