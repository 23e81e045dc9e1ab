use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::network::ApiError;

pub const MIN_GRADE: u8 = 1;
pub const MAX_GRADE: u8 = 3;
pub const TITLE_LEN: (usize, usize) = (2, 140);
pub const CONTENT_LEN: (usize, usize) = (5, 10_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Answered,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: u64,
    pub grade: u8,
    pub title: String,
    pub content: String,
    pub status: SuggestionStatus,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub answered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// Parse an ISO-8601 timestamp with or without an offset.  SQLite-backed
/// deployments drop the offset, so naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
}

mod timestamp {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

impl Suggestion {
    /// Only pending suggestions may be edited or deleted.
    pub fn is_editable(&self) -> bool {
        self.status == SuggestionStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCreate {
    pub grade: u8,
    pub title: String,
    pub content: String,
}

impl SuggestionCreate {
    pub fn new(grade: u8, title: &str, content: &str) -> Self {
        Self { grade, title: title.to_string(), content: content.to_string() }
    }

    /// Trimmed copy, checked against the backend's bounds.
    pub fn validated(&self) -> Result<Self, ApiError> {
        Ok(Self {
            grade: check_grade(self.grade)?,
            title: check_text("title", &self.title, TITLE_LEN)?,
            content: check_text("content", &self.content, CONTENT_LEN)?,
        })
    }
}

/// Partial update; `None` fields are left untouched and omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SuggestionUpdate {
    pub fn validated(&self) -> Result<Self, ApiError> {
        Ok(Self {
            grade: self.grade.map(check_grade).transpose()?,
            title: self.title.as_deref().map(|t| check_text("title", t, TITLE_LEN)).transpose()?,
            content: self
                .content
                .as_deref()
                .map(|c| check_text("content", c, CONTENT_LEN))
                .transpose()?,
        })
    }
}

fn check_grade(grade: u8) -> Result<u8, ApiError> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(grade)
    } else {
        Err(ApiError::Invalid(format!("grade must be between {} and {}", MIN_GRADE, MAX_GRADE)))
    }
}

/// Bounds apply to the value as typed; the trimmed copy is what gets sent.
fn check_text(field: &str, value: &str, (min, max): (usize, usize)) -> Result<String, ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::Invalid(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(value.trim().to_string())
}

/// Keys of a browser `PushSubscription`, as the backend stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscriptionRecord {
    pub id: u64,
    pub student_key: String,
    pub endpoint: String,
}
