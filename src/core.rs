//! Pipeline core: language service client, message store, controller.

pub mod detection;
pub mod language_service;
pub mod pipeline;
pub mod store;
