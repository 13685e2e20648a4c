use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::domain::entity::{Row, RowSet, Value};
use crate::domain::repository::{FilterCondition, RepositoryError, SourceRepository, TableRef};
use crate::infrastructure::sql::{SelectBuilder, SqlBuildError};

/// SQLデータベースを検索元とするリポジトリ
pub struct SqlSourceRepository {
    pool: SqlitePool,
    builder: SelectBuilder,
}

impl SqlSourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            builder: SelectBuilder::new(),
        }
    }

    /// 接続URLからプールを作成する
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(RepositoryError::from)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SourceRepository for SqlSourceRepository {
    async fn select(
        &self,
        table: &TableRef,
        filter: &FilterCondition,
    ) -> Result<RowSet, RepositoryError> {
        let query = self.builder.build(table, filter)?;
        debug!(sql = %query.sql, "executing lookup");

        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = match param {
                Value::Integer(i) => statement.bind(*i),
                Value::Float(f) => statement.bind(*f),
                Value::Text(s) => statement.bind(s.clone()),
                Value::Boolean(b) => statement.bind(*b),
                Value::Timestamp(dt) => statement.bind(dt.to_rfc3339()),
                Value::Null => statement.bind(Option::<String>::None),
            };
        }

        let rows = statement.fetch_all(&self.pool).await?;

        let mut row_set = RowSet::new(table.name.clone(), Vec::new());
        if let Some(first) = rows.first() {
            row_set.columns = first.columns().iter().map(|c| c.name().to_string()).collect();
        }
        for row in &rows {
            row_set.add_row(decode_row(row)?);
        }

        Ok(row_set)
    }
}

/// SQLiteの行を `Row` に変換する
fn decode_row(row: &SqliteRow) -> Result<Row, RepositoryError> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let declared = column.type_info().name().to_uppercase();
        let value = decode_cell(row, index, &declared)?;
        decoded.set(column.name(), value);
    }
    Ok(decoded)
}

fn decode_cell(row: &SqliteRow, index: usize, declared: &str) -> Result<Value, RepositoryError> {
    let storage = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_uppercase()
    };

    let value = match (storage.as_str(), declared) {
        ("INTEGER", "BOOLEAN") => Value::Boolean(row.try_get::<i64, _>(index)? != 0),
        ("INTEGER", _) => Value::Integer(row.try_get(index)?),
        ("REAL", _) => Value::Float(row.try_get(index)?),
        ("TEXT", "DATETIME" | "TIMESTAMP") => {
            let text: String = row.try_get(index)?;
            parse_timestamp(&text).map_or(Value::Text(text), Value::Timestamp)
        }
        ("BLOB", _) => {
            let bytes: Vec<u8> = row.try_get(index)?;
            Value::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::Text(row.try_get(index)?),
    };

    Ok(value)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(e) => RepositoryError::Query(e.message().to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => RepositoryError::Query(error.to_string()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => RepositoryError::Connection(error.to_string()),
            other => RepositoryError::InternalError(other.to_string()),
        }
    }
}

impl From<SqlBuildError> for RepositoryError {
    fn from(error: SqlBuildError) -> Self {
        match error {
            SqlBuildError::InvalidIdentifier(name) => RepositoryError::InvalidIdentifier(name),
            other => RepositoryError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> SqlSourceRepository {
        // インメモリDBは接続ごとに別物なので1接続に固定する
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repository = SqlSourceRepository::new(pool);
        sqlx::query(
            "CREATE TABLE Order1 (Email TEXT, OrderNumber TEXT, Quantity INTEGER, \
             Price REAL, Shipped BOOLEAN, OrderDate DATETIME, Note TEXT)",
        )
        .execute(repository.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO Order1 VALUES \
             ('a@example.com', 'A-1', 2, 9.5, 1, '2024-03-01 10:00:00', NULL), \
             ('b@example.com', 'B-1', 1, 3.0, 0, '2024-03-02 11:30:00', 'gift')",
        )
        .execute(repository.pool())
        .await
        .unwrap();
        repository
    }

    #[tokio::test]
    async fn selects_matching_rows_with_typed_cells() {
        let repository = seeded().await;

        let row_set = repository
            .select(
                &TableRef::new(Some("main"), "Order1"),
                &FilterCondition::equals("Email", "a@example.com"),
            )
            .await
            .unwrap();

        assert_eq!(row_set.source, "Order1");
        assert_eq!(
            row_set.columns,
            vec!["Email", "OrderNumber", "Quantity", "Price", "Shipped", "OrderDate", "Note"]
        );
        assert_eq!(row_set.len(), 1);
        let row = &row_set.rows[0];
        assert_eq!(row.get("OrderNumber"), Some(&Value::from("A-1")));
        assert_eq!(row.get("Quantity"), Some(&Value::Integer(2)));
        assert_eq!(row.get("Price"), Some(&Value::Float(9.5)));
        assert_eq!(row.get("Shipped"), Some(&Value::Boolean(true)));
        assert!(matches!(row.get("OrderDate"), Some(Value::Timestamp(_))));
        assert_eq!(row.get("Note"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn no_match_yields_empty_row_set() {
        let repository = seeded().await;

        let row_set = repository
            .select(
                &TableRef::new(None, "Order1"),
                &FilterCondition::equals("Email", "nobody@example.com"),
            )
            .await
            .unwrap();

        assert!(row_set.is_empty());
    }

    #[tokio::test]
    async fn missing_table_is_a_programming_error() {
        let repository = seeded().await;

        let err = repository
            .select(
                &TableRef::new(Some("main"), "Order9"),
                &FilterCondition::equals("Email", "a@example.com"),
            )
            .await
            .unwrap_err();

        assert!(err.is_programming_error(), "unexpected error: {err:?}");
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn unsafe_identifier_never_reaches_the_database() {
        let repository = seeded().await;

        let err = repository
            .select(
                &TableRef::new(None, "Order1 --"),
                &FilterCondition::equals("Email", "a@example.com"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidIdentifier(_)));
    }

    #[test]
    fn parses_both_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
