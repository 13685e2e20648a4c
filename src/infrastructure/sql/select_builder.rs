use sqlparser::ast::{Ident, ObjectName, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::{Parser, ParserError};
use thiserror::Error;

use crate::domain::entity::Value;
use crate::domain::repository::{FilterCondition, TableRef};

/// SQL組み立てエラー
#[derive(Error, Debug, PartialEq)]
pub enum SqlBuildError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("A filter needs at least one condition")]
    EmptyFilter,

    #[error("SQL syntax error: {0}")]
    SyntaxError(String),
}

impl From<ParserError> for SqlBuildError {
    fn from(err: ParserError) -> Self {
        SqlBuildError::SyntaxError(err.to_string())
    }
}

/// パラメータ付きのSELECT文
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// `SELECT * FROM <schema>.<table> WHERE <col> = ? [AND ...]` を組み立てる
pub struct SelectBuilder {
    dialect: SQLiteDialect,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// 検証済みの識別子をクォートして返す
    fn quoted(name: &str) -> Result<Ident, SqlBuildError> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SqlBuildError::InvalidIdentifier(name.to_string()));
        }
        Ok(Ident::with_quote('"', name))
    }

    fn object_name(table: &TableRef) -> Result<ObjectName, SqlBuildError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(schema) = &table.schema {
            parts.push(Self::quoted(schema)?);
        }
        parts.push(Self::quoted(&table.name)?);
        Ok(ObjectName(parts))
    }

    /// SELECT文を組み立て、構文を検証する
    pub fn build(
        &self,
        table: &TableRef,
        filter: &FilterCondition,
    ) -> Result<SelectQuery, SqlBuildError> {
        let terms = filter.terms();
        if terms.is_empty() {
            return Err(SqlBuildError::EmptyFilter);
        }

        let mut predicates = Vec::with_capacity(terms.len());
        let mut params = Vec::with_capacity(terms.len());
        for (column, value) in terms {
            predicates.push(format!("{} = ?", Self::quoted(column)?));
            params.push(value.clone());
        }

        let sql = format!(
            "SELECT * FROM {} WHERE {}",
            Self::object_name(table)?,
            predicates.join(" AND ")
        );

        self.verify(&sql)?;

        Ok(SelectQuery { sql, params })
    }

    /// 単一のクエリ文として解析できることを確認する
    fn verify(&self, sql: &str) -> Result<(), SqlBuildError> {
        let statements = Parser::parse_sql(&self.dialect, sql)?;
        match statements.as_slice() {
            [Statement::Query(_)] => Ok(()),
            _ => Err(SqlBuildError::SyntaxError(format!(
                "expected a single SELECT statement: {}",
                sql
            ))),
        }
    }
}

impl Default for SelectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
