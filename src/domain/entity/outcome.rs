use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::domain::entity::table::{TableView, UnifiedTable};

/// 利用者に表示するメッセージの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// 利用者に表示するメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display)]
#[display(fmt = "[{}] {}", level, message)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// 1回の検索操作の結果
///
/// 表示するメッセージと、見つかった場合は表示用テーブルを持つ。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    pub notices: Vec<Notice>,
    pub table: Option<UnifiedTable>,
}

impl SearchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) -> &mut Self {
        self.notices.push(notice);
        self
    }

    /// メッセージ1つだけの結果
    pub fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            table: None,
        }
    }

    pub fn with_table(mut self, table: UnifiedTable) -> Self {
        self.table = Some(table);
        self
    }

    /// 指定した重要度のメッセージを持つか
    pub fn has(&self, level: NoticeLevel) -> bool {
        self.notices.iter().any(|n| n.level == level)
    }

    /// 指定した重要度の最初のメッセージ
    pub fn first(&self, level: NoticeLevel) -> Option<&str> {
        self.notices
            .iter()
            .find(|n| n.level == level)
            .map(|n| n.message.as_str())
    }

    pub fn to_view(&self) -> OutcomeView {
        OutcomeView {
            notices: self.notices.clone(),
            table: self.table.as_ref().map(UnifiedTable::to_view),
        }
    }
}

/// JSONで返す検索結果
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeView {
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_level_renders_lowercase() {
        assert_eq!(NoticeLevel::Warning.to_string(), "warning");
        assert_eq!(NoticeLevel::Error.as_ref(), "error");
    }

    #[test]
    fn notice_displays_level_and_message() {
        let notice = Notice::warning("Please enter an email address.");
        assert_eq!(notice.to_string(), "[warning] Please enter an email address.");
    }

    #[test]
    fn view_omits_missing_table() {
        let outcome = SearchOutcome::notice(Notice::info("No orders found."));
        let json = serde_json::to_value(outcome.to_view()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"notices": [{"level": "info", "message": "No orders found."}]})
        );
    }
}
