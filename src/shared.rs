pub mod types;
pub mod settings;
pub mod errors;
pub mod events;
pub mod emit;

#[cfg(test)]
mod types_test;

pub use errors::{PipelineError, PipelineResult, ServiceError, ServiceResult, ValidationError};
