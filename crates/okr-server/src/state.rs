use axum::http::HeaderMap;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Header carrying the acting member's name for the access gate.
pub const USER_HEADER: &str = "x-okr-user";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    /// Fixed "today" for due and status calculations; the local date when unset.
    pub today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self { root, today: None }
    }

    pub fn with_today(mut self, today: Option<NaiveDate>) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// The acting user named by the request, if any.
pub fn request_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
