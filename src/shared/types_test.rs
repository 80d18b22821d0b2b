//! Test to trigger ts-rs bindings export
//! Run with: cargo test export_bindings

#[cfg(test)]
mod tests {
    use ts_rs::TS;

    use crate::api::commands::{Intent, IntentOutcome};
    use crate::shared::events::PipelineEvent;
    use crate::shared::types::*;

    #[test]
    fn export_bindings() {
        // Types read by the presentation layer
        PipelineSnapshot::export().expect("Failed to export PipelineSnapshot");
        Message::export().expect("Failed to export Message");
        TargetLanguage::export().expect("Failed to export TargetLanguage");

        // Intents it sends and events it listens to
        Intent::export().expect("Failed to export Intent");
        IntentOutcome::export().expect("Failed to export IntentOutcome");
        PipelineEvent::export().expect("Failed to export PipelineEvent");
    }
}
