use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// アプリケーション設定（TOMLファイル）
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub records: RecordsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// 最終アクセスからセッションが失効するまでの秒数
    pub session_ttl_secs: u64,

    /// 同時に保持するセッション数の上限
    pub max_sessions: usize,
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080, // デフォルトポート番号
            session_ttl_secs: 30 * 60,
            max_sessions: 10_000,
        }
    }
}

/// 注文テーブルを持つデータベースの設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlxの接続URL。未指定ならインメモリストレージを使う
    pub url: Option<String>,

    /// インメモリストレージに読み込むJSONフィクスチャ
    pub fixture: Option<PathBuf>,

    /// 空文字列ならスキーマ修飾なし
    pub schema: String,
    pub order_tables: Vec<String>,
    pub email_column: String,
}

impl DatabaseConfig {
    pub fn schema(&self) -> Option<&str> {
        non_empty(&self.schema)
    }

    /// SQLiteの接続先に存在しそうにないスキーマが指定されていれば警告文を返す
    ///
    /// SQLiteのスキーマは `main` と `temp`、および ATTACH したデータベース名だけ。
    pub fn schema_warning(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let schema = self.schema()?;
        let builtin = ["main", "temp"].iter().any(|s| schema.eq_ignore_ascii_case(s));
        if !url.starts_with("sqlite:") || builtin {
            return None;
        }
        Some(format!(
            "database.schema is \"{}\" but SQLite only has \"main\" unless another database is attached; \
             set database.schema = \"main\" (or \"\") if lookups fail with \"no such table\"",
            schema
        ))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            fixture: None,
            schema: "SC".to_string(),
            order_tables: vec!["Order1".into(), "Order2".into(), "Order3".into()],
            email_column: "Email".to_string(),
        }
    }
}

/// 外部検索APIの設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 利用者レコード検索の設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub schema: String,

    /// 検索APIが照会するテーブル
    pub tables: Vec<String>,

    /// 統合IDを取り出すテーブル
    pub primary_table: String,
    pub identifier_column: String,
    pub email_column: String,
    pub phone_column: String,
}

impl RecordsConfig {
    pub fn schema(&self) -> Option<&str> {
        non_empty(&self.schema)
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            schema: String::new(),
            tables: vec!["Table1".into(), "Table2".into(), "Table3".into()],
            primary_table: "Table1".to_string(),
            identifier_column: "unified_id".to_string(),
            email_column: "Email".to_string(),
            phone_column: "Phone".to_string(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl AppConfig {
    /// TOML文字列から設定を読み込む
    pub fn from_toml(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 設定ファイルを読み込む。パスがなければデフォルト設定
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&source, &path.display().to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.order_tables.is_empty() {
            return Err(ConfigError::Invalid(
                "database.order_tables must name at least one table".to_string(),
            ));
        }
        if self.records.tables.is_empty() {
            return Err(ConfigError::Invalid(
                "records.tables must name at least one table".to_string(),
            ));
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "server.max_sessions must be at least 1".to_string(),
            ));
        }
        if self.database.url.is_some() && self.database.fixture.is_some() {
            return Err(ConfigError::Invalid(
                "database.url and database.fixture are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}
