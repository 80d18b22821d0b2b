//! Intent dispatch
//!
//! The presentation layer expresses every user action as an [`Intent`] and
//! gets back an [`IntentOutcome`] or a [`PipelineError`]. Both sides are
//! plain serde data so they can cross a process or IPC boundary unchanged.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::core::pipeline::{Pipeline, SummarizeOutcome, TranslateOutcome};
use crate::shared::errors::{PipelineError, PipelineResult, ValidationError};
use crate::shared::types::{MessageId, PipelineSnapshot, TargetLanguage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "commands.ts")]
pub enum Intent {
    Submit { text: String },
    /// Translate into the currently selected target language
    Translate { id: MessageId },
    TranslateTo { id: MessageId, language: TargetLanguage },
    Summarize { id: MessageId },
    /// `language: None` clears every translation of the message
    ClearTranslation {
        id: MessageId,
        language: Option<TargetLanguage>,
    },
    Delete { id: MessageId },
    /// Language code as typed by the user ("es", "spa", "es-MX")
    SetTargetLanguage { language: String },
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "commands.ts")]
pub enum IntentOutcome {
    Submitted { id: MessageId },
    Translation(TranslateOutcome),
    Summary(SummarizeOutcome),
    Cleared { removed: usize },
    Deleted { id: MessageId },
    TargetLanguageSet { language: TargetLanguage },
    Snapshot(PipelineSnapshot),
}

/// Parse a JSON-encoded intent
pub fn parse_intent(raw: &str) -> PipelineResult<Intent> {
    serde_json::from_str(raw).map_err(|e| {
        PipelineError::Validation(ValidationError::MalformedIntent { reason: e.to_string() })
    })
}

/// Resolve a user-typed language code against the supported targets
pub fn resolve_target_language(code: &str) -> PipelineResult<TargetLanguage> {
    TargetLanguage::from_code(code).ok_or_else(|| {
        PipelineError::Validation(ValidationError::UnknownLanguage {
            code: code.trim().to_string(),
        })
    })
}

pub async fn dispatch(pipeline: &Pipeline, intent: Intent) -> PipelineResult<IntentOutcome> {
    tracing::debug!(?intent, "dispatching intent");

    match intent {
        Intent::Submit { text } => {
            let id = pipeline.submit(&text).await?;
            Ok(IntentOutcome::Submitted { id })
        }
        Intent::Translate { id } => Ok(IntentOutcome::Translation(pipeline.translate(id).await?)),
        Intent::TranslateTo { id, language } => Ok(IntentOutcome::Translation(
            pipeline.translate_to(id, language).await?,
        )),
        Intent::Summarize { id } => Ok(IntentOutcome::Summary(pipeline.summarize(id).await?)),
        Intent::ClearTranslation { id, language } => {
            let removed = pipeline.clear_translation(id, language)?;
            Ok(IntentOutcome::Cleared { removed })
        }
        Intent::Delete { id } => {
            pipeline.delete(id)?;
            Ok(IntentOutcome::Deleted { id })
        }
        Intent::SetTargetLanguage { language } => {
            let language = resolve_target_language(&language)?;
            pipeline.set_target_language(language);
            Ok(IntentOutcome::TargetLanguageSet { language })
        }
        Intent::Snapshot => Ok(IntentOutcome::Snapshot(pipeline.snapshot())),
    }
}
