//! # Nexus Renal
//!
//! Chronic kidney disease (CKD) risk prediction over a pre-trained
//! classification pipeline.
//!
//! This crate provides:
//! - Feature adaptation from display-name biomarker records to the fitted
//!   column layout, including the engineered columns
//! - An inference gateway shaping pipeline output into a diagnosis
//! - An HTTP surface (`POST /predict`, `GET /`)
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, AdaptedRecord, PredictionResult)
//! - `ports`: Trait definitions for external operations (Classifier)
//! - `adapters`: Concrete implementations (exported pipeline, axum, log sanitization)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven runtime configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{AdaptedRecord, Diagnosis, PatientRecord, PredictionResult};

/// Result type for Nexus operations
pub type Result<T> = std::result::Result<T, NexusError>;

/// Main error type for Nexus
#[derive(Debug, thiserror::Error)]
pub enum NexusError {
    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
