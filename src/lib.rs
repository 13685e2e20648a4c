pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interface;
pub mod config;

// OrderSearch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// アプリケーション全体の結果型
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Repository error: {0}")]
    Repository(#[from] domain::repository::RepositoryError),

    #[error("Search API error: {0}")]
    Gateway(#[from] domain::repository::GatewayError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] infrastructure::storage::FixtureError),

    #[error("Server error: {0}")]
    Server(String),
}
