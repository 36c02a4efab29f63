//! Oracle Contract
//!
//! The classroom never talks to a language model directly. Every completion
//! goes through the [`Oracle`] trait: an ordered list of role-tagged messages
//! in, one text completion out. Concrete adapters live in the submodules.

mod offline;
mod openai;

pub use offline::OfflineOracle;
pub use openai::OpenAICompatibleOracle;

use async_openai::error::OpenAIError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Text substituted for a free-text completion when the oracle fails.
pub const FALLBACK_TEXT: &str = "Error";
/// Text substituted for a structured completion when the oracle fails.
pub const FALLBACK_JSON: &str = "{}";

/// Errors raised by an oracle round-trip.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Oracle request failed: {0}")]
    Request(#[from] OpenAIError),
    #[error("Oracle returned no content")]
    EmptyResponse,
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// Author of a message in an oracle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleMessage {
    pub role: Role,
    pub content: String,
}

impl OracleMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Whether the caller expects prose or a JSON object back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    FreeText,
    StructuredJson,
}

/// One completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub messages: Vec<OracleMessage>,
    pub mode: ResponseMode,
}

impl OracleRequest {
    pub fn text(messages: Vec<OracleMessage>) -> Self {
        Self {
            messages,
            mode: ResponseMode::FreeText,
        }
    }

    pub fn json(messages: Vec<OracleMessage>) -> Self {
        Self {
            messages,
            mode: ResponseMode::StructuredJson,
        }
    }

    /// Content of the first system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the last user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// The completion capability the classroom depends on.
///
/// Implementations must perform a single bounded round-trip per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// Calls the oracle and degrades any failure to a safe placeholder.
///
/// Structured requests fall back to an empty JSON object, free-text requests
/// to [`FALLBACK_TEXT`].
pub async fn complete_or_fallback(oracle: &dyn Oracle, request: OracleRequest) -> String {
    let mode = request.mode;
    match oracle.complete(request).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, ?mode, "Oracle call failed, using fallback");
            match mode {
                ResponseMode::StructuredJson => FALLBACK_JSON.to_string(),
                ResponseMode::FreeText => FALLBACK_TEXT.to_string(),
            }
        }
    }
}
