//! Message store
//!
//! Ordered, id-keyed collection of messages. Every mutation after insert
//! goes through [`MessageStore::update`] with a [`MessagePatch`], and an
//! unknown id turns the update into a no-op. Completions of operations
//! whose message was deleted in the meantime therefore fall through
//! silently instead of landing on whatever now sits at the old position.

use std::collections::HashMap;

use crate::shared::types::{Message, MessageId, TargetLanguage};

/// Partial, id-scoped change to one message's derived state
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePatch {
    TranslationStarted(TargetLanguage),
    TranslationSucceeded { language: TargetLanguage, text: String },
    TranslationFailed { language: TargetLanguage, error: String },
    /// Call ended without a per-message outcome (capability went missing)
    TranslationAbandoned(TargetLanguage),
    SummaryStarted,
    SummarySucceeded(String),
    SummaryFailed(String),
    SummaryAbandoned,
    /// `None` clears every translation
    TranslationsCleared(Option<TargetLanguage>),
}

#[derive(Debug, Default)]
pub struct MessageStore {
    /// Newest first
    order: Vec<MessageId>,
    messages: HashMap<MessageId, Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new message at the front. Returns false (and changes
    /// nothing) if the id is already present.
    pub fn insert(&mut self, message: Message) -> bool {
        if self.messages.contains_key(&message.id) {
            return false;
        }
        self.order.insert(0, message.id);
        self.messages.insert(message.id, message);
        true
    }

    /// Apply a patch to the message with `id`, returning the updated message.
    /// `None` means the message no longer exists and nothing was changed.
    pub fn update(&mut self, id: MessageId, patch: MessagePatch) -> Option<&Message> {
        let message = self.messages.get_mut(&id)?;
        apply_patch(message, patch);
        Some(message)
    }

    /// Remove a message together with all its derived state
    pub fn delete(&mut self, id: MessageId) -> Option<Message> {
        let message = self.messages.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(message)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    /// Messages newest first
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.order.iter().filter_map(|id| self.messages.get(id))
    }

    pub fn list(&self) -> Vec<Message> {
        self.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}

fn apply_patch(message: &mut Message, patch: MessagePatch) {
    match patch {
        MessagePatch::TranslationStarted(language) => {
            message.status.translating.insert(language);
        }
        MessagePatch::TranslationSucceeded { language, text } => {
            message.status.translating.remove(&language);
            message.translations.insert(language, text);
            message.last_error = None;
        }
        MessagePatch::TranslationFailed { language, error } => {
            message.status.translating.remove(&language);
            message.last_error = Some(error);
        }
        MessagePatch::TranslationAbandoned(language) => {
            message.status.translating.remove(&language);
        }
        MessagePatch::SummaryStarted => {
            message.status.summarizing = true;
        }
        MessagePatch::SummarySucceeded(summary) => {
            message.status.summarizing = false;
            message.summary = Some(summary);
            message.last_error = None;
        }
        MessagePatch::SummaryFailed(error) => {
            message.status.summarizing = false;
            message.last_error = Some(error);
        }
        MessagePatch::SummaryAbandoned => {
            message.status.summarizing = false;
        }
        MessagePatch::TranslationsCleared(Some(language)) => {
            message.translations.remove(&language);
        }
        MessagePatch::TranslationsCleared(None) => {
            message.translations.clear();
        }
    }
}
