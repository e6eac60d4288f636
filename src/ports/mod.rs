//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the trained model artifact).

mod classifier;

pub use classifier::{Classification, Classifier, ModelError, POSITIVE_CLASS};
