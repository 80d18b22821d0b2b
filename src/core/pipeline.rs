//! Pipeline controller
//!
//! Turns user intents into service calls and store patches. All shared
//! state lives in one `PipelineState` behind a mutex that is never held
//! across an `.await`: an intent reads what it needs, marks its operation
//! in flight, releases the lock, suspends on the service call, then
//! re-resolves the message by id before writing the result back. A message
//! deleted in the meantime makes the write a no-op.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ts_rs::TS;
use unicode_segmentation::UnicodeSegmentation;

use super::detection::{normalize_language_tag, same_language};
use super::language_service::{Capabilities, LanguageServiceClient};
use super::store::{MessagePatch, MessageStore};
use crate::shared::emit::EventBus;
use crate::shared::errors::{PipelineError, PipelineResult, ServiceError, ValidationError};
use crate::shared::events::PipelineEvent;
use crate::shared::settings::PipelinePreferences;
use crate::shared::types::{
    Capability, CapabilityState, Detection, Message, MessageId, Notice, NoticeLevel, PipelineSnapshot,
    TargetLanguage,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
#[ts(export, export_to = "pipeline.ts")]
pub enum TranslateOutcome {
    Translated(String),
    /// Same (message, language) already in flight; no call was made
    AlreadyInFlight,
    /// Message was deleted before the call resolved; result dropped
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
#[ts(export, export_to = "pipeline.ts")]
pub enum SummarizeOutcome {
    Summarized(String),
    AlreadyInFlight,
    Discarded,
}

struct PipelineState {
    store: MessageStore,
    target_language: TargetLanguage,
    capability: CapabilityState,
    detecting: BTreeSet<MessageId>,
    last_notice: Option<Notice>,
}

struct PipelineInner {
    client: LanguageServiceClient,
    preferences: PipelinePreferences,
    events: EventBus,
    state: Mutex<PipelineState>,
}

/// Cheap to clone; clones share the same store and client
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    pub fn new(client: LanguageServiceClient, preferences: PipelinePreferences, events: EventBus) -> Self {
        let state = PipelineState {
            store: MessageStore::new(),
            target_language: preferences.default_target_lang,
            capability: CapabilityState::Unprobed,
            detecting: BTreeSet::new(),
            last_notice: None,
        };

        Self {
            inner: Arc::new(PipelineInner {
                client,
                preferences,
                events,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    // ===== Read access =====

    pub fn snapshot(&self) -> PipelineSnapshot {
        let state = self.lock_state();
        PipelineSnapshot {
            messages: state.store.list(),
            target_language: state.target_language,
            capability: state.capability,
            detecting: state.detecting.iter().copied().collect(),
            last_notice: state.last_notice.clone(),
        }
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.lock_state().store.get(id).cloned()
    }

    pub fn target_language(&self) -> TargetLanguage {
        self.lock_state().target_language
    }

    pub fn capability(&self) -> CapabilityState {
        self.lock_state().capability
    }

    /// Whether a summarize intent for `id` would currently be accepted
    pub fn can_summarize(&self, id: MessageId) -> bool {
        let state = self.lock_state();
        let summarizer = !matches!(state.capability, CapabilityState::Ready { summarization: false });
        state.store.get(id).is_some_and(|message| {
            summarizer
                && message.summary.is_none()
                && !message.status.summarizing
                && self.summary_affordance(message).is_ok()
        })
    }

    // ===== Intents =====

    /// Probe the language service up front so a missing capability is
    /// visible before the first submit.
    pub async fn probe(&self) -> CapabilityState {
        self.probed_capabilities().await;
        self.capability()
    }

    pub fn set_target_language(&self, language: TargetLanguage) {
        let mut state = self.lock_state();
        if state.target_language != language {
            state.target_language = language;
            tracing::debug!(target_lang = language.code(), "target language changed");
            self.emit(PipelineEvent::TargetLanguageChanged(language));
        }
    }

    /// Detect the language of `text` and insert it as a new message.
    ///
    /// Either exactly one message is inserted, or the store is untouched and
    /// an error is returned.
    pub async fn submit(&self, text: &str) -> PipelineResult<MessageId> {
        if text.trim().is_empty() {
            let mut state = self.lock_state();
            return Err(self.reject(&mut state, ValidationError::EmptyInput, None));
        }
        self.ensure_available().await?;

        let id = MessageId::new();
        self.lock_state().detecting.insert(id);
        self.emit(PipelineEvent::DetectionStarted(id));
        tracing::debug!(%id, "detecting language");

        let result = self.inner.client.detect(text).await;

        let mut state = self.lock_state();
        state.detecting.remove(&id);
        self.emit(PipelineEvent::DetectionFinished(id));

        match result {
            Ok(detection) => {
                let language = normalize_language_tag(&detection.language)
                    .unwrap_or_else(|| detection.language.trim().to_ascii_lowercase());
                let message = Message::new(
                    id,
                    text.to_string(),
                    Detection { language, confidence: detection.confidence },
                );
                let inserted = state.store.insert(message.clone());
                debug_assert!(inserted, "fresh message id collided");

                tracing::info!(
                    %id,
                    language = %message.detected_language,
                    confidence = ?message.detection_confidence,
                    "message submitted"
                );
                self.emit(PipelineEvent::MessageInserted(message));
                Ok(id)
            }
            Err(error) => {
                tracing::warn!(%id, %error, "detection failed, nothing inserted");
                match error.missing_capability() {
                    Some(capability) => self.note_unavailable(&mut state, capability),
                    None => self.raise_notice(&mut state, NoticeLevel::Error, error.to_string(), None),
                }
                Err(error.into())
            }
        }
    }

    /// Translate into the currently selected target language.
    ///
    /// The selection is read once, here; changing it while the call is in
    /// flight does not redirect the result.
    pub async fn translate(&self, id: MessageId) -> PipelineResult<TranslateOutcome> {
        let target = self.target_language();
        self.translate_to(id, target).await
    }

    pub async fn translate_to(&self, id: MessageId, target: TargetLanguage) -> PipelineResult<TranslateOutcome> {
        self.ensure_available().await?;

        let (text, source) = {
            let mut state = self.lock_state();
            let (text, source, in_flight) = match state.store.get(id) {
                Some(message) => (
                    message.text.clone(),
                    message.detected_language.clone(),
                    message.status.is_translating_to(target),
                ),
                None => return Err(PipelineError::MessageNotFound(id)),
            };

            if in_flight {
                tracing::debug!(%id, target_lang = target.code(), "translation already in flight, ignoring");
                return Ok(TranslateOutcome::AlreadyInFlight);
            }
            if same_language(&source, target.code()) {
                return Err(self.reject(&mut state, ValidationError::SameLanguage { language: target }, Some(id)));
            }

            self.patch(&mut state, id, MessagePatch::TranslationStarted(target));
            (text, source)
        };

        tracing::info!(%id, from = %source, to = target.code(), "translation issued");
        let result = self.inner.client.translate(&text, &source, target).await;

        let mut state = self.lock_state();
        match result {
            Ok(translated) => {
                let patch = MessagePatch::TranslationSucceeded {
                    language: target,
                    text: translated.clone(),
                };
                if self.patch(&mut state, id, patch).is_none() {
                    tracing::info!(%id, "message deleted while translating, result discarded");
                    return Ok(TranslateOutcome::Discarded);
                }
                tracing::info!(%id, to = target.code(), "translation merged");
                Ok(TranslateOutcome::Translated(translated))
            }
            Err(error) => {
                // A vanished capability is pipeline state, not this message's error
                let unavailable = error.missing_capability();
                let patch = match unavailable {
                    Some(capability) => {
                        self.note_unavailable(&mut state, capability);
                        MessagePatch::TranslationAbandoned(target)
                    }
                    None => MessagePatch::TranslationFailed {
                        language: target,
                        error: error.to_string(),
                    },
                };
                if self.patch(&mut state, id, patch).is_none() {
                    tracing::info!(%id, %error, "message deleted while translating, failure discarded");
                    return Ok(TranslateOutcome::Discarded);
                }
                if unavailable.is_some() {
                    self.raise_notice(&mut state, NoticeLevel::Error, error.to_string(), Some(id));
                }
                tracing::warn!(%id, to = target.code(), %error, "translation failed");
                Err(error.into())
            }
        }
    }

    /// Summarize a message. Only offered for messages in the configured
    /// summarizable language whose length exceeds the configured threshold.
    pub async fn summarize(&self, id: MessageId) -> PipelineResult<SummarizeOutcome> {
        {
            let mut state = self.lock_state();
            let verdict = match state.store.get(id) {
                Some(message) => self.summary_affordance(message),
                None => return Err(PipelineError::MessageNotFound(id)),
            };
            if let Err(error) = verdict {
                return Err(self.reject(&mut state, error, Some(id)));
            }
        }

        // The probe answer is cached; a summarizer that vanished mid-call
        // only shows up in the pipeline's own capability state
        let caps = self.probed_capabilities().await;
        if !caps.summarization || self.capability() == (CapabilityState::Ready { summarization: false }) {
            let error = ServiceError::ServiceUnavailable(Capability::Summarization);
            let mut state = self.lock_state();
            self.note_unavailable(&mut state, Capability::Summarization);
            self.raise_notice(&mut state, NoticeLevel::Error, error.to_string(), Some(id));
            return Err(error.into());
        }

        let text = {
            let mut state = self.lock_state();
            let (text, summarizing, summarized) = match state.store.get(id) {
                Some(message) => (message.text.clone(), message.status.summarizing, message.summary.is_some()),
                None => return Err(PipelineError::MessageNotFound(id)),
            };

            if summarizing {
                tracing::debug!(%id, "summary already in flight, ignoring");
                return Ok(SummarizeOutcome::AlreadyInFlight);
            }
            if summarized {
                return Err(self.reject(&mut state, ValidationError::AlreadySummarized, Some(id)));
            }

            self.patch(&mut state, id, MessagePatch::SummaryStarted);
            text
        };

        tracing::info!(%id, "summary issued");
        let result = self.inner.client.summarize(&text).await;

        let mut state = self.lock_state();
        match result {
            Ok(summary) => {
                if self
                    .patch(&mut state, id, MessagePatch::SummarySucceeded(summary.clone()))
                    .is_none()
                {
                    tracing::info!(%id, "message deleted while summarizing, result discarded");
                    return Ok(SummarizeOutcome::Discarded);
                }
                tracing::info!(%id, "summary stored");
                Ok(SummarizeOutcome::Summarized(summary))
            }
            Err(error) => {
                let unavailable = error.missing_capability();
                let patch = match unavailable {
                    Some(capability) => {
                        self.note_unavailable(&mut state, capability);
                        MessagePatch::SummaryAbandoned
                    }
                    None => MessagePatch::SummaryFailed(error.to_string()),
                };
                if self.patch(&mut state, id, patch).is_none() {
                    return Ok(SummarizeOutcome::Discarded);
                }
                if unavailable.is_some() {
                    self.raise_notice(&mut state, NoticeLevel::Error, error.to_string(), Some(id));
                }
                tracing::warn!(%id, %error, "summary failed");
                Err(error.into())
            }
        }
    }

    /// Remove one translation, or all of them when `language` is `None`.
    /// Returns how many entries were removed.
    pub fn clear_translation(&self, id: MessageId, language: Option<TargetLanguage>) -> PipelineResult<usize> {
        let mut state = self.lock_state();
        let removed = match state.store.get(id) {
            Some(message) => match language {
                Some(lang) => usize::from(message.translations.contains_key(&lang)),
                None => message.translations.len(),
            },
            None => return Err(PipelineError::MessageNotFound(id)),
        };

        if removed > 0 {
            self.patch(&mut state, id, MessagePatch::TranslationsCleared(language));
        }
        tracing::info!(%id, lang = ?language.map(TargetLanguage::code), removed, "translations cleared");
        Ok(removed)
    }

    /// Delete a message immediately, whatever is in flight for it
    pub fn delete(&self, id: MessageId) -> PipelineResult<()> {
        let mut state = self.lock_state();
        let removed = state.store.delete(id).ok_or(PipelineError::MessageNotFound(id))?;

        tracing::info!(
            %id,
            in_flight = removed.status.is_translating() || removed.status.summarizing,
            remaining = state.store.len(),
            "message deleted"
        );
        self.emit(PipelineEvent::MessageDeleted(id));
        Ok(())
    }

    // ===== Internals =====

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("pipeline state mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit(&self, event: PipelineEvent) {
        self.inner.events.emit(event);
    }

    /// Single write path for every message mutation
    fn patch(&self, state: &mut PipelineState, id: MessageId, patch: MessagePatch) -> Option<Message> {
        let updated = state.store.update(id, patch)?.clone();
        self.emit(PipelineEvent::MessageUpdated(updated.clone()));
        Some(updated)
    }

    fn raise_notice(&self, state: &mut PipelineState, level: NoticeLevel, text: String, message_id: Option<MessageId>) {
        let notice = Notice::new(level, text, message_id);
        state.last_notice = Some(notice.clone());
        self.emit(PipelineEvent::Notice(notice));
    }

    fn reject(&self, state: &mut PipelineState, error: ValidationError, message_id: Option<MessageId>) -> PipelineError {
        tracing::info!(id = ?message_id, %error, "intent rejected");
        self.raise_notice(state, NoticeLevel::Validation, error.to_string(), message_id);
        error.into()
    }

    fn summary_affordance(&self, message: &Message) -> Result<(), ValidationError> {
        let prefs = &self.inner.preferences;
        let length = message.text.graphemes(true).count();

        if same_language(&message.detected_language, &prefs.summarizable_language)
            && length > prefs.summary_min_chars
        {
            Ok(())
        } else {
            Err(ValidationError::SummaryNotOffered {
                language: prefs.summarizable_language.clone(),
                min_chars: prefs.summary_min_chars,
            })
        }
    }

    fn set_capability(&self, state: &mut PipelineState, next: CapabilityState) {
        if state.capability == next {
            return;
        }
        if let CapabilityState::Missing { capability } = next {
            tracing::error!(%capability, "language capability missing, pipeline disabled");
            let text = ServiceError::ServiceUnavailable(capability).to_string();
            self.raise_notice(state, NoticeLevel::Error, text, None);
        }
        state.capability = next;
        self.emit(PipelineEvent::CapabilityChanged(next));
    }

    /// A call reported its capability missing even though the probe said otherwise
    fn note_unavailable(&self, state: &mut PipelineState, capability: Capability) {
        let next = match (capability, state.capability) {
            (_, missing @ CapabilityState::Missing { .. }) => missing,
            (Capability::Summarization, _) => CapabilityState::Ready { summarization: false },
            (other, _) => CapabilityState::Missing { capability: other },
        };
        self.set_capability(state, next);
    }

    /// Probe once (the client caches the answer) and mirror it into state
    async fn probed_capabilities(&self) -> Capabilities {
        let caps = self.inner.client.capabilities().await;
        let mut state = self.lock_state();
        if state.capability == CapabilityState::Unprobed {
            self.set_capability(&mut state, CapabilityState::from(caps));
        }
        caps
    }

    /// Refuse submit/translate while detection or translation is missing
    async fn ensure_available(&self) -> PipelineResult<()> {
        self.probed_capabilities().await;
        match self.capability() {
            CapabilityState::Missing { capability } => Err(ServiceError::ServiceUnavailable(capability).into()),
            _ => Ok(()),
        }
    }
}
