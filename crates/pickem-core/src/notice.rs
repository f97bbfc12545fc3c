// Transient, dismissible notices shown to the user.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Notice {
            level,
            message: message.into(),
            raised_at: now,
        }
    }

    pub fn info(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NoticeLevel::Info, message, now)
    }

    pub fn success(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NoticeLevel::Success, message, now)
    }

    pub fn warning(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NoticeLevel::Warning, message, now)
    }

    pub fn error(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NoticeLevel::Error, message, now)
    }

    /// Whether the notice has been on screen for at least `ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.raised_at >= ttl
    }
}
