//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! The feature adapter lives here because it is a pure function between
//! the external and internal record types.

mod diagnosis;
pub mod features;
mod patient;

pub use diagnosis::{round_to, Diagnosis, PredictionResult, PROBABILITY_DECIMALS};
pub use features::{normalize_flag, AdaptedRecord, Cell, COLUMN_NAMES, HEMO_PCV_EPSILON};
pub use patient::{Observation, PatientRecord, FIELD_NAMES};

#[cfg(test)]
pub(crate) use patient::sample_record;
