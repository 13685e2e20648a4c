#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use ordersearch::config::AppConfig;
use ordersearch::domain::repository::SearchGateway;
use ordersearch::infrastructure::client::SearchApiClient;
use ordersearch::infrastructure::repository::MemorySourceRepository;
use ordersearch::infrastructure::storage::{fixture::load_fixture_str, MemoryStorage};
use ordersearch::interface::server::{build_router, serve};
use axum::Router;

pub const FIXTURE: &str = r#"{
  "tables": {
    "SC.Order1": [
      {"Email": "ada@example.com", "OrderNumber": "A-1", "Description": "Lamp", "OrderDate": "2024-01-01"}
    ],
    "SC.Order2": [
      {"email": "ada@example.com", "ordernumber": "B-1", "description": "Desk", "orderdate": "2024-02-01"},
      {"email": "bob@example.com", "ordernumber": "B-2", "description": "Chair", "orderdate": "2024-02-02"}
    ],
    "SC.Order3": [],
    "Table1": [
      {"Email": "ada@example.com", "Phone": "555-0100", "unified_id": 42, "FirstName": "Ada", "LastName": "Lovelace"}
    ],
    "Table2": [
      {"Email": "ada@example.com", "Phone": "555-0100", "firstname": "Ada", "lastname": "Lovelace"},
      {"Email": "ada@example.com", "Phone": "555-0100", "firstname": "Ada", "lastname": "Lovelace"}
    ],
    "Table3": [
      {"Email": "ada@example.com", "Phone": "000-0000", "firstname": "Augusta", "lastname": "King"}
    ]
  }
}"#;

/// フィクスチャを読み込んだサーバーを空きポートで起動し、ベースURLを返す
///
/// 検索ページのAPIクライアントは同じサーバーの検索APIを呼ぶ。
pub async fn spawn_app(config: AppConfig) -> String {
    let storage = Arc::new(MemoryStorage::new());
    load_fixture_str(FIXTURE, &storage).expect("fixture loads");
    let repository = Arc::new(MemorySourceRepository::new(storage));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let gateway: Arc<dyn SearchGateway> =
        Arc::new(SearchApiClient::new(base_url.clone(), Duration::from_secs(5)).unwrap());
    let app = build_router(&config, repository, gateway);

    tokio::spawn(async move {
        serve(listener, app).await.expect("server runs");
    });

    base_url
}

/// 任意のルーターを空きポートで起動し、ベースURLを返す
pub fn spawn_router(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        serve(listener, app).await.expect("stub server runs");
    });

    base_url
}
