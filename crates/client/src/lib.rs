//! HTTP client for the plant recognition and registration services.
//!
//! - [`api`] wraps the two HTTP endpoints using [`reqwest`] and reports
//!   raw wire errors.
//! - [`outcome`] defines the classified results handed to callers.
//! - [`pipeline`] ties image preparation, validation, and the API
//!   together, and classifies every call into an outcome.
//! - [`config`] loads endpoint URLs and timeouts from the environment.

pub mod api;
pub mod config;
pub mod outcome;
pub mod pipeline;

pub use api::{PlantApi, PlantApiError};
pub use config::{ClientConfig, ConfigError};
pub use outcome::{CreateResult, Failure, FailureKind, RecognitionResult};
pub use pipeline::SubmissionPipeline;
