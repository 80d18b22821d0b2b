use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::settings::PipelineSettings;
use super::types::{CapabilityState, Message, MessageId, Notice, TargetLanguage};

/// Events the presentation layer re-renders from.
///
/// Every store mutation produces exactly one event carrying the message as
/// it looks after the patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload")]
#[ts(export, export_to = "events.ts")]
pub enum PipelineEvent {
    #[serde(rename = "detection://started")]
    DetectionStarted(MessageId),

    #[serde(rename = "detection://finished")]
    DetectionFinished(MessageId),

    #[serde(rename = "message://inserted")]
    MessageInserted(Message),

    #[serde(rename = "message://updated")]
    MessageUpdated(Message),

    #[serde(rename = "message://deleted")]
    MessageDeleted(MessageId),

    #[serde(rename = "target://changed")]
    TargetLanguageChanged(TargetLanguage),

    #[serde(rename = "capability://changed")]
    CapabilityChanged(CapabilityState),

    #[serde(rename = "notice://raised")]
    Notice(Notice),

    #[serde(rename = "settings://updated")]
    SettingsUpdated(PipelineSettings),
}
