use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model API returned no choices")]
    EmptyResponse,

    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(String),
}
