use axum::{
    Router,
    routing::{get, post},
    Extension,
    Server,
};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::application::{OrderHistoryService, OrderSearchService, RecordSearchService};
use crate::config::AppConfig;
use crate::domain::repository::{SearchGateway, SourceRepository, TableRef};
use crate::infrastructure::client::SearchApiClient;
use crate::infrastructure::repository::{MemorySourceRepository, SqlSourceRepository};
use crate::infrastructure::storage::{load_fixture, MemoryStorage};
use crate::interface::api::handler::{
    health_check_handler,
    search_orders_handler,
    search_records_handler,
};
use crate::interface::api::SearchApiState;
use crate::interface::web::handler::{
    fetch_orders_action,
    fetch_records_action,
    index_handler,
    search_orders_action,
};
use crate::interface::web::{SessionStore, WebState};
use crate::{Error, Result};

/// 設定に応じて検索元リポジトリを用意する
///
/// 接続URLがあればSQLデータベース、なければインメモリストレージ（フィクスチャ付き）。
pub async fn build_repository(config: &AppConfig) -> Result<Arc<dyn SourceRepository>> {
    if let Some(url) = &config.database.url {
        if let Some(warning) = config.database.schema_warning() {
            warn!("{}", warning);
        }
        info!("データベースに接続中...");
        let repository = SqlSourceRepository::connect(url).await?;
        return Ok(Arc::new(repository));
    }

    let storage = Arc::new(MemoryStorage::new());
    if let Some(path) = &config.database.fixture {
        let tables = load_fixture(path, &storage)?;
        info!(tables, path = %path.display(), "フィクスチャを読み込みました");
    }
    Ok(Arc::new(MemorySourceRepository::new(storage)))
}

/// ルーターを組み立てる
pub fn build_router(
    config: &AppConfig,
    repository: Arc<dyn SourceRepository>,
    gateway: Arc<dyn SearchGateway>,
) -> Router {
    let order_tables: Vec<TableRef> = config
        .database
        .order_tables
        .iter()
        .map(|name| TableRef::new(config.database.schema(), name.clone()))
        .collect();
    let record_tables: Vec<TableRef> = config
        .records
        .tables
        .iter()
        .map(|name| TableRef::new(config.records.schema(), name.clone()))
        .collect();

    let api_state = Arc::new(SearchApiState {
        repository: repository.clone(),
        record_tables,
        order_tables,
        email_column: config.records.email_column.clone(),
        phone_column: config.records.phone_column.clone(),
    });

    let web_state = Arc::new(WebState {
        order_search: OrderSearchService::builder()
            .repository(repository)
            .schema(config.database.schema().map(str::to_string))
            .tables(config.database.order_tables.clone())
            .email_column(config.database.email_column.clone())
            .build(),
        record_search: RecordSearchService::builder()
            .gateway(gateway.clone())
            .primary_table(config.records.primary_table.clone())
            .identifier_column(config.records.identifier_column.clone())
            .build(),
        order_history: OrderHistoryService::new(gateway),
        sessions: SessionStore::with_limits(
            config.server.session_ttl(),
            config.server.max_sessions,
        ),
    });

    Router::new()
        // 検索ページ
        .route("/", get(index_handler))
        .route("/actions/orders/search", post(search_orders_action))
        .route("/actions/records/fetch", post(fetch_records_action))
        .route("/actions/orders/fetch", post(fetch_orders_action))
        // 検索API
        .route("/health", get(health_check_handler))
        .route("/search", post(search_records_handler))
        .route("/search_order", get(search_orders_handler))
        .layer(Extension(api_state))
        .layer(Extension(web_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// バインド済みのリスナーでサーバーを起動する
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    listener
        .set_nonblocking(true)
        .map_err(|e| Error::Server(e.to_string()))?;

    Server::from_tcp(listener)
        .map_err(|e| Error::Server(e.to_string()))?
        .serve(app.into_make_service())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    // 検索元リポジトリとAPIクライアントの初期化
    let repository = build_repository(&config).await?;
    let client = SearchApiClient::new(config.api.base_url.clone(), config.api.timeout())?;
    info!(api = %client.base_url(), "検索APIの接続先");
    let gateway: Arc<dyn SearchGateway> = Arc::new(client);

    let app = build_router(&config, repository, gateway);

    // サーバーのアドレス設定
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Server(format!("invalid listen address: {}", e)))?;
    let listener = TcpListener::bind(addr).map_err(|e| Error::Server(e.to_string()))?;

    info!("サーバーを{}で起動中...", addr);

    serve(listener, app).await
}
