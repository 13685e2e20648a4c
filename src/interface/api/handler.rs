use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::repository::{
    FilterCondition, RecordTable, RepositoryError, SourceRepository, TableRef,
};

/// API エラー
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// エラーレスポンス
#[derive(Serialize)]
pub struct ErrorResponse {
    detail: String,
}

/// 検索APIが参照するテーブルとカラム
pub struct SearchApiState {
    pub repository: Arc<dyn SourceRepository>,
    pub record_tables: Vec<TableRef>,
    pub order_tables: Vec<TableRef>,
    pub email_column: String,
    pub phone_column: String,
}

/// `POST /search` のリクエスト
#[derive(Deserialize)]
pub struct RecordSearchRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
}

/// `GET /search_order` のクエリパラメータ
#[derive(Deserialize)]
pub struct OrderSearchParams {
    #[serde(default)]
    email: String,
}

/// ヘルスチェックハンドラー
pub async fn health_check_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// 利用者レコード検索ハンドラー
pub async fn search_records_handler(
    Extension(state): Extension<Arc<SearchApiState>>,
    payload: Result<Json<RecordSearchRequest>, JsonRejection>,
) -> Result<Json<Vec<RecordTable>>, ApiError> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    let phone = payload.phone.trim();
    if email.is_empty() || phone.is_empty() {
        return Err(ApiError::Validation("email and phone are required".to_string()));
    }

    let filter = FilterCondition::And(vec![
        FilterCondition::equals(&state.email_column, email),
        FilterCondition::equals(&state.phone_column, phone),
    ]);

    let mut tables = Vec::with_capacity(state.record_tables.len());
    for table in &state.record_tables {
        let row_set = state.repository.select(table, &filter).await.map_err(|e| {
            error!(table = %table, error = %e, "record lookup failed");
            e
        })?;
        tables.push(RecordTable::new(table.name.clone(), row_set.to_json_rows()));
    }

    info!(tables = tables.len(), "record search served");
    Ok(Json(tables))
}

/// 注文検索ハンドラー（テーブル名 -> 行のリスト）
pub async fn search_orders_handler(
    Extension(state): Extension<Arc<SearchApiState>>,
    params: Result<Query<OrderSearchParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(params) = params?;
    let email = params.email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".to_string()));
    }

    let filter = FilterCondition::equals(&state.email_column, email);

    let mut body = serde_json::Map::new();
    for table in &state.order_tables {
        let row_set = state.repository.select(table, &filter).await.map_err(|e| {
            error!(table = %table, error = %e, "order lookup failed");
            e
        })?;
        body.insert(
            table.name.clone(),
            serde_json::Value::Array(row_set.to_json_rows()),
        );
    }

    info!(tables = body.len(), "order search served");
    Ok(Json(serde_json::Value::Object(body)))
}
