//! `okr-assist`: asks an OpenAI-compatible chat-completions endpoint for an
//! OKR draft.
//!
//! The crate only owns the request: a fixed Portuguese system instruction
//! plus the user's free-text prompt. What comes back is returned verbatim;
//! turning it into objectives is `okr_core::draft::parse_ai_response`.
//!
//! ```rust,ignore
//! use okr_assist::{AssistConfig, DraftClient};
//!
//! let client = DraftClient::new(AssistConfig::new(endpoint, model, api_key));
//! let raw = client.generate("Crescer no Nordeste em 2025", "Acme").await?;
//! ```

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{AssistConfig, DraftClient};
pub use error::AssistError;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AssistError>;
