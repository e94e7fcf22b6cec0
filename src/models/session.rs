use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// One-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Set once the visitor has logged in
    pub user_id: Option<i64>,
    pub remember: bool,
    pub flashes: Vec<Flash>,
    /// Unix seconds
    pub expires_at: i64,
}

impl Session {
    pub fn anonymous(expires_at: i64) -> Self {
        Self {
            user_id: None,
            remember: false,
            flashes: Vec::new(),
            expires_at,
        }
    }

    pub fn is_expired(&self, current_time: i64) -> bool {
        current_time >= self.expires_at
    }
}
