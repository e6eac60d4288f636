//! Adapters layer: Concrete implementations of ports and outer surfaces.
//!
//! These modules contain the actual integration with external libraries:
//! - `pipeline`: exported classification pipeline (serde_json, sha2)
//! - `http`: axum routes
//! - `sanitize`: patient-data redaction for logs

pub mod http;
pub mod pipeline;
pub mod sanitize;

pub use pipeline::PipelineAdapter;
