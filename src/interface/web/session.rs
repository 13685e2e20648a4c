use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{header::COOKIE, HeaderMap};
use tokio::sync::RwLock;
use tracing::debug;

pub const SESSION_COOKIE: &str = "session_id";

/// セッションに保存するフォーム入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInputs {
    pub email: String,
    pub phone: String,
}

/// セッションの既定の有効期間
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// 同時に保持するセッション数の既定の上限
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct SessionEntry {
    inputs: SessionInputs,
    last_seen: Instant,
}

/// セッションごとの入力値を保持するストア
///
/// 最終アクセスから `ttl` を過ぎたエントリは無効になり、保存時に取り除かれる。
/// 上限に達している場合は最終アクセスが最も古いエントリを追い出す。
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// 有効なセッションの入力値を取得し、最終アクセス時刻を更新する
    pub async fn get(&self, session_id: &str) -> Option<SessionInputs> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        if entry.last_seen.elapsed() >= self.ttl {
            sessions.remove(session_id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.inputs.clone())
    }

    pub async fn store(&self, session_id: &str, inputs: SessionInputs) {
        let mut sessions = self.sessions.write().await;
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);

        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                debug!(session = %oldest, "evicting least recently used session");
                sessions.remove(&oldest);
            }
        }

        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                inputs,
                last_seen: Instant::now(),
            },
        );
    }

    /// 保持しているセッション数（期限切れで未回収のものを含む）
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 新しいセッションIDを発行する
    pub fn new_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// CookieヘッダーからセッションIDを取り出す
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, id)| id)
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// セッションIDを設定する `Set-Cookie` ヘッダーの値
pub fn session_cookie(session_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id)
}
