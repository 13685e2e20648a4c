use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::projection::{ORDER_COLUMNS, ORDER_SOURCE_COLUMN};
use crate::domain::entity::{
    Notice, RowSet, SearchOutcome, SearchQuery, TableError, UnifiedTable,
};
use crate::domain::repository::{RecordTable, SearchGateway};

const NO_ORDERS: &str = "No orders found.";

/// 検索APIで注文履歴を取得するサービス
pub struct OrderHistoryService {
    gateway: Arc<dyn SearchGateway>,
}

impl OrderHistoryService {
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self, email: &str) -> SearchOutcome {
        let query = match SearchQuery::by_email(email) {
            Ok(query) => query,
            Err(e) => return SearchOutcome::notice(Notice::warning(e.to_string())),
        };

        let tables = match self.gateway.search_orders(&query.email).await {
            Ok(tables) => tables,
            Err(e) => {
                error!(error = %e, "order history lookup failed");
                let mut outcome = SearchOutcome::notice(Notice::error(e.to_string()));
                outcome.push(Notice::info(NO_ORDERS));
                return outcome;
            }
        };

        if tables.is_empty() {
            return SearchOutcome::notice(Notice::info(NO_ORDERS));
        }

        let combined = match combine(&tables) {
            Ok(Some(combined)) => combined,
            Ok(None) => return SearchOutcome::notice(Notice::info("No valid rows found.")),
            Err(e) => {
                error!(error = %e, "order history returned malformed rows");
                let mut outcome = SearchOutcome::notice(Notice::error(e.to_string()));
                outcome.push(Notice::info(NO_ORDERS));
                return outcome;
            }
        };

        match combined.project(&ORDER_COLUMNS) {
            Ok(projected) => {
                info!(rows = projected.len(), "order history matched");
                SearchOutcome::notice(Notice::success("Orders found across sources!"))
                    .with_table(projected)
            }
            Err(TableError::MissingColumns(missing)) => {
                warn!(?missing, "order history lacks display columns");
                SearchOutcome::notice(Notice::error(format!(
                    "Missing required columns: {}",
                    missing.join(", ")
                )))
            }
            Err(e) => SearchOutcome::notice(Notice::error(e.to_string())),
        }
    }
}

/// 空でないテーブルの行に取得元を付けて連結する
fn combine(tables: &[RecordTable]) -> Result<Option<UnifiedTable>, TableError> {
    let mut row_sets = Vec::with_capacity(tables.len());
    for record in tables.iter().filter(|t| !t.rows.is_empty()) {
        let mut row_set = RowSet::from_json_rows(record.table_name.clone(), &record.rows)?;
        row_set.normalize_columns();
        row_set.tag_source(ORDER_SOURCE_COLUMN);
        row_sets.push(row_set);
    }
    Ok(UnifiedTable::concat(row_sets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{NoticeLevel, Value};
    use crate::domain::repository::{GatewayError, MockSearchGateway};
    use serde_json::json;

    fn service(gateway: MockSearchGateway) -> OrderHistoryService {
        OrderHistoryService::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn combines_orders_from_every_table() {
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_search_orders()
            .withf(|email| email == "ada@example.com")
            .returning(|_| {
                Ok(vec![
                    RecordTable::new(
                        "Order1",
                        vec![json!({"OrderNumber": "A-1", "Description": "Lamp", "OrderDate": "2024-01-01"})],
                    ),
                    RecordTable::new("Order2", vec![]),
                    RecordTable::new(
                        "Order3",
                        vec![json!({"ordernumber": "C-1", "description": "Desk", "orderdate": "2024-02-01"})],
                    ),
                ])
            });

        let outcome = service(gateway).fetch("ada@example.com").await;

        let table = outcome.table.as_ref().expect("table");
        assert_eq!(table.columns, ORDER_COLUMNS);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("sourcetable"), Some(&Value::from("Order3")));
        assert_eq!(
            outcome.first(NoticeLevel::Success),
            Some("Orders found across sources!")
        );
    }

    #[tokio::test]
    async fn only_empty_tables_means_no_valid_rows() {
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_search_orders()
            .returning(|_| Ok(vec![RecordTable::new("Order1", vec![])]));

        let outcome = service(gateway).fetch("ada@example.com").await;

        assert_eq!(outcome.first(NoticeLevel::Info), Some("No valid rows found."));
        assert!(outcome.table.is_none());
    }

    #[tokio::test]
    async fn empty_mapping_means_no_orders() {
        let mut gateway = MockSearchGateway::new();
        gateway.expect_search_orders().returning(|_| Ok(Vec::new()));

        let outcome = service(gateway).fetch("ada@example.com").await;

        assert_eq!(outcome.first(NoticeLevel::Info), Some(NO_ORDERS));
    }

    #[tokio::test]
    async fn missing_columns_are_listed() {
        let mut gateway = MockSearchGateway::new();
        gateway.expect_search_orders().returning(|_| {
            Ok(vec![RecordTable::new("Order1", vec![json!({"OrderNumber": "A-1"})])])
        });

        let outcome = service(gateway).fetch("ada@example.com").await;

        assert_eq!(
            outcome.first(NoticeLevel::Error),
            Some("Missing required columns: description, orderdate")
        );
        assert!(outcome.table.is_none());
    }

    #[tokio::test]
    async fn connection_failure_is_shown_then_no_orders() {
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_search_orders()
            .returning(|_| Err(GatewayError::Connection("connection refused".into())));

        let outcome = service(gateway).fetch("ada@example.com").await;

        assert_eq!(
            outcome.notices.iter().map(|n| n.level).collect::<Vec<_>>(),
            vec![NoticeLevel::Error, NoticeLevel::Info]
        );
        assert_eq!(
            outcome.first(NoticeLevel::Error),
            Some("Failed to connect to the API: connection refused")
        );
    }

    #[tokio::test]
    async fn blank_email_never_calls_the_api() {
        let mut gateway = MockSearchGateway::new();
        gateway.expect_search_orders().times(0);

        let outcome = service(gateway).fetch("").await;

        assert!(outcome.has(NoticeLevel::Warning));
    }
}
