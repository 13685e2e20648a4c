use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::repository::{GatewayError, OrderTables, RecordTable, SearchGateway};

/// `POST /search` のリクエストボディ
#[derive(Debug, Serialize)]
struct RecordSearchRequest<'a> {
    email: &'a str,
    phone: &'a str,
}

/// 外部検索APIのHTTPクライアント
#[derive(Debug, Clone)]
pub struct SearchApiClient {
    client: Client,
    base_url: String,
}

impl SearchApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 200以外の応答を `detail` フィールド付きのエラーに変換する
    async fn status_error(response: Response) -> GatewayError {
        let status = response.status();
        let detail = match response.json::<serde_json::Value>().await {
            Ok(body) => match body.get("detail") {
                Some(serde_json::Value::String(detail)) => detail.clone(),
                Some(other) => other.to_string(),
                None => "Unknown error".to_string(),
            },
            Err(_) => "Unknown error".to_string(),
        };
        warn!(status = status.as_u16(), %detail, "search API returned an error");

        GatewayError::Status {
            status: status.as_u16(),
            detail,
        }
    }
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_decode() {
        GatewayError::Decode(error.to_string())
    } else {
        GatewayError::Connection(error.to_string())
    }
}

#[async_trait]
impl SearchGateway for SearchApiClient {
    async fn search_records(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Vec<RecordTable>, GatewayError> {
        let response = self
            .client
            .post(self.url("/search"))
            .json(&RecordSearchRequest { email, phone })
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }

        let tables: Vec<RecordTable> = response.json().await.map_err(transport_error)?;
        debug!(tables = tables.len(), "record search returned");
        Ok(tables)
    }

    async fn search_orders(&self, email: &str) -> Result<OrderTables, GatewayError> {
        let response = self
            .client
            .get(self.url("/search_order"))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }

        // キー順を保ったままテーブル名ごとの行に分解する
        let body: serde_json::Map<String, serde_json::Value> =
            response.json().await.map_err(transport_error)?;

        body.into_iter()
            .map(|(table_name, rows)| match rows {
                serde_json::Value::Array(rows) => Ok(RecordTable::new(table_name, rows)),
                serde_json::Value::Null => Ok(RecordTable::new(table_name, Vec::new())),
                other => Err(GatewayError::Decode(format!(
                    "rows for {} are not a list: {}",
                    table_name, other
                ))),
            })
            .collect()
    }
}
