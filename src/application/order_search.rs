use std::sync::Arc;

use tracing::{error, info, warn};
use typed_builder::TypedBuilder;

use crate::application::projection::{or_list, ORDER_COLUMNS, ORDER_SOURCE_COLUMN};
use crate::domain::entity::{Notice, RowSet, SearchOutcome, SearchQuery, UnifiedTable};
use crate::domain::repository::{FilterCondition, SourceRepository, TableRef};

fn default_tables() -> Vec<String> {
    vec!["Order1".into(), "Order2".into(), "Order3".into()]
}

/// 注文テーブルを横断してメールアドレスで検索するサービス
#[derive(TypedBuilder)]
pub struct OrderSearchService {
    repository: Arc<dyn SourceRepository>,

    #[builder(default = Some("SC".to_string()), setter(into))]
    schema: Option<String>,

    #[builder(default = default_tables())]
    tables: Vec<String>,

    #[builder(default = "Email".to_string(), setter(into))]
    email_column: String,
}

impl OrderSearchService {
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// すべての注文テーブルを順に検索し、表示用の結果を返す
    ///
    /// 途中のテーブルで失敗した場合はそこで打ち切り、それまでに見つかった
    /// 行はそのまま結果に含める。
    pub async fn search(&self, email: &str) -> SearchOutcome {
        let query = match SearchQuery::by_email(email) {
            Ok(query) => query,
            Err(e) => return SearchOutcome::notice(Notice::warning(e.to_string())),
        };

        let mut outcome = SearchOutcome::new();
        let matches = self.collect_matches(&query, &mut outcome).await;

        let Some(table) = UnifiedTable::concat(matches) else {
            outcome.push(Notice::info(format!(
                "No matching records found in {}.",
                or_list(&self.tables)
            )));
            return outcome;
        };

        match table.project(&ORDER_COLUMNS) {
            Ok(projected) => {
                info!(rows = projected.len(), "order search matched");
                outcome.push(Notice::success("Match found in one or more tables"));
                outcome.with_table(projected)
            }
            Err(e) => {
                warn!(error = %e, "order rows lack display columns");
                outcome.push(Notice::error(e.to_string()));
                outcome
            }
        }
    }

    async fn collect_matches(&self, query: &SearchQuery, outcome: &mut SearchOutcome) -> Vec<RowSet> {
        let filter = FilterCondition::equals(&self.email_column, query.email.as_str());
        let mut matches = Vec::new();

        for name in &self.tables {
            let table = TableRef::new(self.schema.as_deref(), name.clone());
            match self.repository.select(&table, &filter).await {
                Ok(mut row_set) if !row_set.is_empty() => {
                    row_set.normalize_columns();
                    row_set.tag_source(ORDER_SOURCE_COLUMN);
                    matches.push(row_set);
                }
                Ok(_) => {}
                Err(e) if e.is_programming_error() => {
                    error!(table = %table, error = %e, "order lookup query failed");
                    outcome.push(Notice::error(format!("Programming error: {}", e)));
                    break;
                }
                Err(e) => {
                    error!(table = %table, error = %e, "order lookup failed");
                    outcome.push(Notice::error(format!("Failed to search: {}", e)));
                    break;
                }
            }
        }

        matches
    }
}
