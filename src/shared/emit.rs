use tokio::sync::broadcast;

use super::events::PipelineEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of pipeline events to any number of presentation subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Having no subscriber is normal (headless use, tests) and not an error.
    pub fn emit(&self, event: PipelineEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("pipeline event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{MessageId, TargetLanguage};

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = MessageId::new();

        bus.emit(PipelineEvent::TargetLanguageChanged(TargetLanguage::Russian));
        bus.emit(PipelineEvent::MessageDeleted(id));

        assert_eq!(
            rx.recv().await.unwrap(),
            PipelineEvent::TargetLanguageChanged(TargetLanguage::Russian)
        );
        assert_eq!(rx.recv().await.unwrap(), PipelineEvent::MessageDeleted(id));
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.emit(PipelineEvent::TargetLanguageChanged(TargetLanguage::French));
    }

    #[test]
    fn test_event_wire_format() {
        let event = PipelineEvent::TargetLanguageChanged(TargetLanguage::Spanish);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "target://changed");
        assert_eq!(value["payload"], "es");
    }
}
