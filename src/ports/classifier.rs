//! Classifier port: Trait for the pre-trained classification pipeline.
//!
//! This trait abstracts the serialized model artifact from the application
//! logic. The pipeline owns imputation, scaling, categorical encoding and the
//! final estimator; callers only see labels and class probabilities.

use crate::domain::AdaptedRecord;

/// Class label of the positive (disease) class.
pub const POSITIVE_CLASS: u8 = 1;

/// Error type for classifier operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: {reason}")]
    TypeMismatch { column: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Model artifact digest mismatch (expected {expected}, got {actual})")]
    DigestMismatch { expected: String, actual: String },

    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Label and positive-class probability for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Predicted class label
    pub label: u8,
    /// Probability mass assigned to [`POSITIVE_CLASS`]
    pub positive_probability: f64,
}

/// Trait for a fitted binary classification pipeline.
///
/// Implementations are loaded once and shared read-only across requests,
/// so all methods take `&self`.
pub trait Classifier: Send + Sync {
    /// Class labels in the order `predict_proba` reports them.
    fn classes(&self) -> &[u8];

    /// Predict the class label for a record.
    ///
    /// # Errors
    /// Returns `ModelError` if the record does not match the fitted layout.
    fn predict(&self, record: &AdaptedRecord) -> Result<u8, ModelError>;

    /// Probability distribution over [`Classifier::classes`].
    ///
    /// # Errors
    /// Returns `ModelError` if the record does not match the fitted layout.
    fn predict_proba(&self, record: &AdaptedRecord) -> Result<Vec<f64>, ModelError>;

    /// Label plus positive-class probability.
    ///
    /// # Errors
    /// Returns `ModelError` if prediction fails or the pipeline has no
    /// positive class.
    fn classify(&self, record: &AdaptedRecord) -> Result<Classification, ModelError> {
        let label = self.predict(record)?;
        let proba = self.predict_proba(record)?;

        let index = self
            .classes()
            .iter()
            .position(|&c| c == POSITIVE_CLASS)
            .ok_or_else(|| ModelError::Shape("pipeline has no positive class".into()))?;
        let positive_probability = *proba.get(index).ok_or_else(|| {
            ModelError::Shape(format!(
                "probability vector has {} entries, expected at least {}",
                proba.len(),
                index + 1
            ))
        })?;

        Ok(Classification {
            label,
            positive_probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_record;

    struct Fixed {
        classes: Vec<u8>,
        proba: Vec<f64>,
    }

    impl Classifier for Fixed {
        fn classes(&self) -> &[u8] {
            &self.classes
        }

        fn predict(&self, _record: &AdaptedRecord) -> Result<u8, ModelError> {
            Ok(1)
        }

        fn predict_proba(&self, _record: &AdaptedRecord) -> Result<Vec<f64>, ModelError> {
            Ok(self.proba.clone())
        }
    }

    #[test]
    fn test_classify_picks_positive_class_mass() {
        let record = AdaptedRecord::from_patient(&sample_record());
        let model = Fixed {
            classes: vec![1, 0],
            proba: vec![0.8, 0.2],
        };
        let c = model.classify(&record).expect("classify");
        assert_eq!(c.label, 1);
        assert!((c.positive_probability - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classify_without_positive_class_fails() {
        let record = AdaptedRecord::from_patient(&sample_record());
        let model = Fixed {
            classes: vec![0, 2],
            proba: vec![0.5, 0.5],
        };
        assert!(matches!(model.classify(&record), Err(ModelError::Shape(_))));
    }
}
