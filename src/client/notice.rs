use chrono::{DateTime, Duration, Utc};

/// How long a notice stays on screen.
pub const NOTICE_TTL_MS: i64 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.raised_at + Duration::milliseconds(NOTICE_TTL_MS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Transient on-screen messages. Nothing is retried; a failure just shows up here.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    active: Vec<Notice>,
}

impl Notices {
    pub fn info(&mut self, message: impl Into<String>) {
        self.raise_at(message, false, Utc::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(notice = %message, "client operation failed");
        self.raise_at(message, true, Utc::now());
    }

    /// Records a notice, dropping any that expired before it was raised.
    pub fn raise_at(&mut self, message: impl Into<String>, is_error: bool, raised_at: DateTime<Utc>) {
        self.prune(raised_at);
        self.active.push(Notice {
            message: message.into(),
            is_error,
            raised_at,
        });
    }

    /// Drops every notice whose display time has passed.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.active.retain(|notice| !notice.is_expired(now));
    }

    pub fn active(&self) -> &[Notice] {
        &self.active
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.active.last()
    }
}
