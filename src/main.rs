use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ordersearch::config::AppConfig;
use ordersearch::interface::server::start_server;
use ordersearch::VERSION;

/// メールアドレスで注文と利用者レコードを検索するポータル
#[derive(Parser, Debug)]
#[command(name = "ordersearch", version, about)]
struct Cli {
    /// TOML設定ファイル
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 待ち受けポート
    #[arg(short, long)]
    port: Option<u16>,

    /// 注文テーブルを持つデータベースのURL（例: sqlite://orders.db）
    #[arg(long)]
    database_url: Option<String>,

    /// インメモリストレージに読み込むJSONフィクスチャ
    #[arg(long, conflicts_with = "database_url")]
    fixture: Option<PathBuf>,

    /// 検索APIのベースURL
    #[arg(long)]
    api_url: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = Some(url);
            config.database.fixture = None;
        }
        if let Some(fixture) = self.fixture {
            config.database.fixture = Some(fixture);
            config.database.url = None;
        }
        if let Some(api_url) = self.api_url {
            config.api.base_url = api_url;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    info!("OrderSearch version: {}", VERSION);

    start_server(config).await?;
    Ok(())
}
