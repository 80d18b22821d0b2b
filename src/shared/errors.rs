//! Error taxonomy for the message pipeline
//!
//! `ServiceError` is what the language service client reports,
//! `ValidationError` covers intents rejected before any service call, and
//! `PipelineError` is what every intent returns. All variants serialize so
//! they can cross the presentation boundary as data.

use serde::Serialize;
use thiserror::Error;

use super::types::{Capability, MessageId, TargetLanguage};

/// Failures reported by the language service client
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ServiceError {
    /// The capability does not exist in this environment at all
    #[error("{0} is not available in this environment")]
    ServiceUnavailable(Capability),

    #[error("Language detection failed: {0}")]
    DetectionFailed(String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("Translation from '{from}' to '{to}' is not supported")]
    UnsupportedLanguagePair { from: String, to: String },

    #[error("Summarization failed: {0}")]
    SummarizationFailed(String),
}

impl ServiceError {
    /// Capability reported missing, if this is an availability failure
    pub fn missing_capability(&self) -> Option<Capability> {
        match self {
            ServiceError::ServiceUnavailable(capability) => Some(*capability),
            _ => None,
        }
    }
}

/// Intents rejected before any service call
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Type a message before submitting")]
    EmptyInput,

    #[error("This message is already in {language}")]
    SameLanguage { language: TargetLanguage },

    #[error("Summaries are only offered for '{language}' messages longer than {min_chars} characters")]
    SummaryNotOffered { language: String, min_chars: usize },

    #[error("This message already has a summary")]
    AlreadySummarized,

    #[error("Unsupported target language: {code}")]
    UnknownLanguage { code: String },

    #[error("Malformed intent: {reason}")]
    MalformedIntent { reason: String },
}

/// Error returned by every pipeline intent
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail")]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Message {0} not found")]
    MessageNotFound(MessageId),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
