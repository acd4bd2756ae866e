use thiserror::Error;

#[derive(Debug, Error)]
pub enum OkrError {
    #[error("not initialized: run 'okr init'")]
    NotInitialized,

    #[error("cycle not found: {0}")]
    CycleNotFound(String),

    #[error("cycle already exists: {0}")]
    CycleExists(String),

    #[error("objective not found: {0}")]
    ObjectiveNotFound(String),

    #[error("objective already exists: {0}")]
    ObjectiveExists(String),

    #[error("key result not found: {0}")]
    KeyResultNotFound(String),

    #[error("link not found: {source_id} -> {target_id}")]
    LinkNotFound { source_id: String, target_id: String },

    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("team already exists: {0}")]
    TeamExists(String),

    #[error("notification not found: {0}")]
    NotificationNotFound(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid objective type: {0}")]
    InvalidObjectiveType(String),

    #[error("invalid ambition: {0}")]
    InvalidAmbition(String),

    #[error("invalid confidence: {0}")]
    InvalidConfidence(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid cycle dates: end {end} is before start {start}")]
    InvalidCycleRange { start: String, end: String },

    #[error("a {source_type} objective cannot link to a {target_type} objective ({convention})")]
    InvalidLink {
        source_type: String,
        target_type: String,
        convention: String,
    },

    #[error("an objective cannot link to itself: {0}")]
    SelfLink(String),

    #[error("draft line {line}: {message} (\"{text}\")")]
    DraftLine {
        line: usize,
        text: String,
        message: String,
    },

    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    #[error("permission denied: {user} ({role}) cannot {action}")]
    PermissionDenied {
        user: String,
        role: String,
        action: String,
    },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OkrError>;
