//! Message pipeline
//!
//! Submitted text is language-detected and stored; translations into six
//! target languages and summaries of long English messages are produced on
//! demand. See [`crate::core::pipeline::Pipeline`] for the entry point and
//! [`api::commands`] for the serializable intent surface.

pub mod api;
pub mod core;
pub mod shared;

use tracing_subscriber::EnvFilter;

pub use crate::core::language_service::{http::HttpLanguageProvider, LanguageProvider, LanguageServiceClient};
pub use crate::core::pipeline::{Pipeline, SummarizeOutcome, TranslateOutcome};
pub use crate::shared::emit::EventBus;
pub use crate::shared::settings::{PipelinePreferences, PipelineSettings, ProviderSettings};

/// Install the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
