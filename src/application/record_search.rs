use std::sync::Arc;

use tracing::{debug, error, info};
use typed_builder::TypedBuilder;

use crate::application::projection::{FIRST_NAME_COLUMN, LAST_NAME_COLUMN, RECORD_SOURCE_COLUMN};
use crate::domain::entity::{
    Notice, Row, RowSet, SearchOutcome, SearchQuery, TableError, UnifiedTable, Value,
};
use crate::domain::repository::{RecordTable, SearchGateway};

const NO_RECORDS: &str = "No matching records found.";

/// 検索APIで利用者レコードを探すサービス
#[derive(TypedBuilder)]
pub struct RecordSearchService {
    gateway: Arc<dyn SearchGateway>,

    /// 統合IDを取り出すテーブル
    #[builder(default = "Table1".to_string(), setter(into))]
    primary_table: String,

    #[builder(default = "unified_id".to_string(), setter(into))]
    identifier_column: String,
}

impl RecordSearchService {
    /// メールアドレスと電話番号でレコードを検索する
    pub async fn fetch(&self, email: &str, phone: &str) -> SearchOutcome {
        let query = match SearchQuery::by_contact(email, phone) {
            Ok(query) => query,
            Err(e) => return SearchOutcome::notice(Notice::warning(e.to_string())),
        };
        let phone = query.phone.as_deref().unwrap_or_default();

        let tables = match self.gateway.search_records(&query.email, phone).await {
            Ok(tables) => tables,
            Err(e) => {
                error!(error = %e, "record search failed");
                let mut outcome = SearchOutcome::notice(Notice::error(e.to_string()));
                outcome.push(Notice::info(NO_RECORDS));
                return outcome;
            }
        };

        if tables.is_empty() {
            return SearchOutcome::notice(Notice::info(NO_RECORDS));
        }

        match self.combine(&tables) {
            Ok(Some(table)) => {
                info!(rows = table.len(), "record search matched");
                let mut outcome = SearchOutcome::notice(Notice::success("User records found!"));
                outcome.push(Notice::info(format!("Searched Email: {}", query.email)));
                outcome.with_table(table)
            }
            Ok(None) => SearchOutcome::notice(Notice::warning("No names found across the tables.")),
            Err(e) => {
                error!(error = %e, "record search returned malformed rows");
                let mut outcome = SearchOutcome::notice(Notice::error(e.to_string()));
                outcome.push(Notice::info(NO_RECORDS));
                outcome
            }
        }
    }

    /// 各テーブルの行を名前だけに絞り、統合IDを付けて連結する
    fn combine(&self, tables: &[RecordTable]) -> Result<Option<UnifiedTable>, TableError> {
        let id_column = self.identifier_column.to_lowercase();

        let mut row_sets = Vec::with_capacity(tables.len());
        let mut unified_id = Value::Null;

        for record in tables.iter().filter(|t| !t.rows.is_empty()) {
            let mut source = RowSet::from_json_rows(record.table_name.clone(), &record.rows)?;
            source.normalize_columns();

            if record.table_name == self.primary_table && source.columns.contains(&id_column) {
                unified_id = source.rows[0].get(&id_column).cloned().unwrap_or(Value::Null);
            }

            let mut names = RowSet::new(
                record.table_name.clone(),
                vec![
                    id_column.clone(),
                    FIRST_NAME_COLUMN.to_string(),
                    LAST_NAME_COLUMN.to_string(),
                ],
            );
            for row in &source.rows {
                names.add_row(Row::from_iter([
                    (id_column.as_str(), Value::Null),
                    (FIRST_NAME_COLUMN, name_or_empty(row, FIRST_NAME_COLUMN)),
                    (LAST_NAME_COLUMN, name_or_empty(row, LAST_NAME_COLUMN)),
                ]));
            }
            names.tag_source(RECORD_SOURCE_COLUMN);
            row_sets.push(names);
        }

        let Some(mut combined) = UnifiedTable::concat(row_sets) else {
            return Ok(None);
        };
        debug!(unified_id = %unified_id, primary_table = %self.primary_table, "propagating identifier");
        combined.fill_column(&id_column, &unified_id);
        combined.dedup();

        Ok(Some(combined))
    }
}

fn name_or_empty(row: &Row, column: &str) -> Value {
    row.get(column).cloned().unwrap_or_else(Value::empty_text)
}
