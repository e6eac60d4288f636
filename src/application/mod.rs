//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use case of the application: CKD risk prediction.

mod inference;

pub use inference::{InferenceService, ModelState};
