use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Opaque message identifier, assigned once at submit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "pipeline.ts")]
pub struct MessageId(#[ts(type = "string")] Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of languages a message can be translated into.
///
/// The serialized form is the wire code handed to the language provider;
/// the display name is only for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "fr")]
    French,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 6] = [
        TargetLanguage::English,
        TargetLanguage::Portuguese,
        TargetLanguage::Spanish,
        TargetLanguage::Russian,
        TargetLanguage::Turkish,
        TargetLanguage::French,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::English => "en",
            TargetLanguage::Portuguese => "pt",
            TargetLanguage::Spanish => "es",
            TargetLanguage::Russian => "ru",
            TargetLanguage::Turkish => "tr",
            TargetLanguage::French => "fr",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Portuguese => "Portuguese",
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::Russian => "Russian",
            TargetLanguage::Turkish => "Turkish",
            TargetLanguage::French => "French",
        }
    }

    /// Resolve a language tag ("es", "ES", "spa", "es-MX") to a target language
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = crate::core::detection::normalize_language_tag(code)?;
        Self::ALL.into_iter().find(|lang| lang.code() == normalized)
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// First (authoritative) detection candidate returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub struct Detection {
    pub language: String,
    pub confidence: Option<f32>,
}

/// In-flight indicators for a single message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub struct MessageStatus {
    /// Target languages with a translate call currently outstanding
    pub translating: BTreeSet<TargetLanguage>,
    pub summarizing: bool,
}

impl MessageStatus {
    pub fn is_translating(&self) -> bool {
        !self.translating.is_empty()
    }

    pub fn is_translating_to(&self, language: TargetLanguage) -> bool {
        self.translating.contains(&language)
    }
}

/// A submitted text plus everything derived from it.
///
/// Messages only exist once detection has succeeded, so
/// `detected_language` is always populated. `text` is never rewritten;
/// the store mutates derived fields through patches only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub detected_language: String,
    pub detection_confidence: Option<f32>,
    pub translations: BTreeMap<TargetLanguage, String>,
    pub summary: Option<String>,
    pub status: MessageStatus,
    pub last_error: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, text: String, detection: Detection) -> Self {
        Self {
            id,
            text,
            detected_language: detection.language,
            detection_confidence: detection.confidence,
            translations: BTreeMap::new(),
            summary: None,
            status: MessageStatus::default(),
            last_error: None,
            created_at: Utc::now(),
        }
    }
}

/// Capabilities the environment may or may not provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "pipeline.ts")]
pub enum Capability {
    Detection,
    Translation,
    Summarization,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Detection => "Language detection",
            Capability::Translation => "Translation",
            Capability::Summarization => "Summarization",
        };
        f.write_str(name)
    }
}

/// Pipeline-level availability of the language service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "pipeline.ts")]
pub enum CapabilityState {
    /// Not probed yet; probing happens on first use
    Unprobed,
    Ready { summarization: bool },
    /// Detection or translation is missing; submit and translate are disabled
    Missing { capability: Capability },
}

impl CapabilityState {
    pub fn is_blocking(&self) -> bool {
        matches!(self, CapabilityState::Missing { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "pipeline.ts")]
pub enum NoticeLevel {
    Validation,
    Error,
}

/// Transient user-visible notice (validation rejections, failed detections)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub message_id: Option<MessageId>,
    #[ts(type = "string")]
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>, message_id: Option<MessageId>) -> Self {
        Self {
            level,
            text: text.into(),
            message_id,
            raised_at: Utc::now(),
        }
    }
}

/// Everything the presentation layer reads, copied out under one lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pipeline.ts")]
pub struct PipelineSnapshot {
    /// Newest first
    pub messages: Vec<Message>,
    pub target_language: TargetLanguage,
    pub capability: CapabilityState,
    /// Submissions whose detection call has not resolved yet
    pub detecting: Vec<MessageId>,
    pub last_notice: Option<Notice>,
}
