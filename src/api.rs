//! Presentation boundary
//!
//! Whatever drives the pipeline (a CLI, a webview, a test) talks to it
//! through the serializable intents in [`commands`].

pub mod commands;
