pub mod config;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;

pub use pipeline::{Envelope, Pipeline, PipelineError};
