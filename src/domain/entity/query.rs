use thiserror::Error;
use typed_builder::TypedBuilder;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter an email address.")]
    MissingEmail,

    #[error("Please enter both an email and a phone number.")]
    MissingContact,
}

/// 検索フォームの入力
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct SearchQuery {
    #[builder(setter(into))]
    pub email: String,

    #[builder(default, setter(strip_option, into))]
    pub phone: Option<String>,
}

impl SearchQuery {
    /// メールアドレスだけの検索
    pub fn by_email(email: &str) -> Result<Self, QueryError> {
        let email = non_blank(email).ok_or(QueryError::MissingEmail)?;
        Ok(Self::builder().email(email).build())
    }

    /// メールアドレスと電話番号の両方が必要な検索
    pub fn by_contact(email: &str, phone: &str) -> Result<Self, QueryError> {
        match (non_blank(email), non_blank(phone)) {
            (Some(email), Some(phone)) => Ok(Self::builder().email(email).phone(phone).build()),
            _ => Err(QueryError::MissingContact),
        }
    }
}

fn non_blank(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
