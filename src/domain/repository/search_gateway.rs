use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 検索APIのエラー
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// 200以外の応答（`detail` フィールドの内容）
    #[error("Error: {detail}")]
    Status { status: u16, detail: String },

    #[error("Failed to connect to the API: {0}")]
    Connection(String),

    #[error("Unexpected response from the API: {0}")]
    Decode(String),
}

/// 1つのテーブルの検索結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    pub table_name: String,
    pub rows: Vec<serde_json::Value>,
}

impl RecordTable {
    pub fn new(table_name: impl Into<String>, rows: Vec<serde_json::Value>) -> Self {
        Self {
            table_name: table_name.into(),
            rows,
        }
    }
}

/// テーブル名ごとの注文行（APIが返した順）
pub type OrderTables = Vec<RecordTable>;

/// 外部検索サービスへの窓口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// メールアドレスと電話番号で利用者レコードを検索する
    async fn search_records(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Vec<RecordTable>, GatewayError>;

    /// メールアドレスで注文履歴を検索する
    async fn search_orders(&self, email: &str) -> Result<OrderTables, GatewayError>;
}
