use axum::{
    extract::{Extension, Json},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{Html, IntoResponse},
};
use itertools::Itertools;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::application::{OrderHistoryService, OrderSearchService, RecordSearchService};
use crate::domain::entity::{Notice, OutcomeView, SearchOutcome, SearchQuery};
use crate::interface::web::page::INDEX_HTML;
use crate::interface::web::session::{self, SessionInputs, SessionStore};

/// 検索ページが使うサービス群
pub struct WebState {
    pub order_search: OrderSearchService,
    pub record_search: RecordSearchService,
    pub order_history: OrderHistoryService,
    pub sessions: SessionStore,
}

/// フォームの入力値
#[derive(Deserialize, Default)]
pub struct FormInput {
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
}

/// 検索ページ
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// 注文テーブル横断検索（データベース）
pub async fn search_orders_action(
    Extension(state): Extension<Arc<WebState>>,
    Json(input): Json<FormInput>,
) -> Json<OutcomeView> {
    let outcome = state.order_search.search(&input.email).await;
    log_outcome("orders/search", &outcome);
    Json(outcome.to_view())
}

/// 利用者レコード検索（API）
///
/// メールアドレスと電話番号がそろっていれば、セッションに保存して
/// 注文履歴の取得で使えるようにする。
pub async fn fetch_records_action(
    Extension(state): Extension<Arc<WebState>>,
    headers: HeaderMap,
    Json(input): Json<FormInput>,
) -> impl IntoResponse {
    let mut response_headers = HeaderMap::new();

    if let Ok(query) = SearchQuery::by_contact(&input.email, &input.phone) {
        let session_id = match session::session_id(&headers) {
            Some(id) => id,
            None => {
                let id = SessionStore::new_session_id();
                if let Ok(cookie) = HeaderValue::from_str(&session::session_cookie(&id)) {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                id
            }
        };
        debug!(session = %session_id, "storing search inputs in session");
        state
            .sessions
            .store(
                &session_id,
                SessionInputs {
                    email: query.email,
                    phone: query.phone.unwrap_or_default(),
                },
            )
            .await;
    }

    let outcome = state.record_search.fetch(&input.email, &input.phone).await;
    log_outcome("records/fetch", &outcome);
    (response_headers, Json(outcome.to_view()))
}

/// 注文履歴の取得（API）。セッションに保存されたメールアドレスを使う
pub async fn fetch_orders_action(
    Extension(state): Extension<Arc<WebState>>,
    headers: HeaderMap,
) -> Json<OutcomeView> {
    let inputs = match session::session_id(&headers) {
        Some(id) => state.sessions.get(&id).await,
        None => None,
    };

    let outcome = match inputs {
        Some(inputs) => state.order_history.fetch(&inputs.email).await,
        None => SearchOutcome::notice(Notice::warning("Enter an email and phone number first.")),
    };
    log_outcome("orders/fetch", &outcome);
    Json(outcome.to_view())
}

fn log_outcome(action: &str, outcome: &SearchOutcome) {
    debug!(
        action,
        rows = outcome.table.as_ref().map_or(0, |t| t.len()),
        notices = %outcome.notices.iter().join("; "),
        "action completed"
    );
}
