//! Pipeline adapter: Implementation of `Classifier` over an exported pipeline.
//!
//! The training side exports the fitted preprocessing + estimator pipeline to
//! JSON. This adapter replays it:
//!
//! 1. Column selection by name (missing columns fail the call)
//! 2. Numeric columns: median imputation of non-finite values, then
//!    standardization `(x - mean) / scale`
//! 3. Categorical columns: one-hot encoding against the fitted categories
//!    (unknown categories encode to all zeros)
//! 4. Logistic regression over the encoded vector
//!
//! # Integrity
//!
//! The artifact's SHA-256 digest can be pinned. When a digest is configured,
//! an artifact whose bytes do not hash to it is refused.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{AdaptedRecord, Cell, Observation};
use crate::ports::{Classifier, ModelError};

/// Default artifact filename, looked up when a directory is given.
pub const DEFAULT_ARTIFACT_NAME: &str = "pipeline_final.json";

/// Artifact format understood by this adapter.
const FORMAT_VERSION: u32 = 1;

/// Fitted pipeline parameters exported by the training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedPipeline {
    pub format_version: u32,
    #[serde(default)]
    pub estimator: Option<String>,
    pub classes: Vec<u8>,
    pub numeric_features: Vec<String>,
    pub numeric_imputer_median: Vec<f64>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub categorical_features: Vec<String>,
    pub categories: Vec<Vec<String>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ExportedPipeline {
    /// Width of the encoded feature vector.
    #[must_use]
    pub fn encoded_width(&self) -> usize {
        self.numeric_features.len() + self.categories.iter().map(Vec::len).sum::<usize>()
    }

    /// Check that parameter shapes agree with each other.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` describing the first mismatch.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::InvalidArtifact(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        if let Some(estimator) = &self.estimator {
            if estimator != "logistic_regression" {
                return Err(ModelError::InvalidArtifact(format!(
                    "unsupported estimator {estimator:?}"
                )));
            }
        }
        if self.classes != [0, 1] {
            return Err(ModelError::InvalidArtifact(format!(
                "classes must be [0, 1], got {:?}",
                self.classes
            )));
        }

        let n = self.numeric_features.len();
        if self.numeric_imputer_median.len() != n
            || self.scaler_mean.len() != n
            || self.scaler_scale.len() != n
        {
            return Err(ModelError::InvalidArtifact(
                "numeric parameter lengths do not match numeric_features length".into(),
            ));
        }
        if self.categories.len() != self.categorical_features.len() {
            return Err(ModelError::InvalidArtifact(
                "categories length does not match categorical_features length".into(),
            ));
        }
        if n + self.categorical_features.len() == 0 {
            return Err(ModelError::InvalidArtifact("pipeline has no features".into()));
        }
        if self.coefficients.len() != self.encoded_width() {
            return Err(ModelError::InvalidArtifact(format!(
                "coefficients length {} does not match encoded width {}",
                self.coefficients.len(),
                self.encoded_width()
            )));
        }
        let all_finite = self
            .numeric_imputer_median
            .iter()
            .chain(&self.scaler_mean)
            .chain(&self.scaler_scale)
            .chain(&self.coefficients)
            .all(|v| v.is_finite())
            && self.intercept.is_finite();
        if !all_finite {
            return Err(ModelError::InvalidArtifact(
                "pipeline parameters must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 of a byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Classifier backed by an exported logistic regression pipeline.
#[derive(Debug, Clone)]
pub struct PipelineAdapter {
    model: ExportedPipeline,
    source: PathBuf,
    sha256: String,
}

impl PipelineAdapter {
    /// Load and validate a pipeline artifact.
    ///
    /// `path` may be the artifact file or a directory containing
    /// [`DEFAULT_ARTIFACT_NAME`]. When `expected_sha256` is set the artifact
    /// bytes must hash to it.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, the digest does not match,
    /// or the JSON is not a valid pipeline export.
    pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ModelError> {
        let artifact_path = if path.is_dir() {
            path.join(DEFAULT_ARTIFACT_NAME)
        } else {
            path.to_path_buf()
        };

        let bytes = std::fs::read(&artifact_path)?;
        let actual = sha256_hex(&bytes);

        if let Some(expected) = expected_sha256 {
            let expected = expected.trim().to_ascii_lowercase();
            if !constant_time_eq_str(&actual, &expected) {
                return Err(ModelError::DigestMismatch { expected, actual });
            }
            tracing::info!("Model artifact digest verified");
        }

        let adapter = Self::from_slice(&bytes, artifact_path, actual)?;

        tracing::info!(
            "Loaded pipeline from {:?} (numeric={}, categorical={}, encoded_width={})",
            adapter.source,
            adapter.model.numeric_features.len(),
            adapter.model.categorical_features.len(),
            adapter.model.encoded_width()
        );
        Ok(adapter)
    }

    fn from_slice(bytes: &[u8], source: PathBuf, sha256: String) -> Result<Self, ModelError> {
        let model: ExportedPipeline = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        model.validate()?;
        Ok(Self {
            model,
            source,
            sha256,
        })
    }

    /// Build an adapter from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` if the parameters are inconsistent.
    pub fn from_exported(model: ExportedPipeline) -> Result<Self, ModelError> {
        model.validate()?;
        let sha256 = serde_json::to_vec(&model)
            .map(|b| sha256_hex(&b))
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        Ok(Self {
            model,
            source: PathBuf::from("<memory>"),
            sha256,
        })
    }

    /// Path the artifact was loaded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// SHA-256 of the artifact bytes.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Fitted parameters.
    #[must_use]
    pub fn exported(&self) -> &ExportedPipeline {
        &self.model
    }

    /// Run the preprocessing stages and return the encoded feature vector.
    ///
    /// # Errors
    /// Returns `MissingColumn` when a fitted column is absent,
    /// `TypeMismatch` when a numeric column holds text and `InvalidInput`
    /// when a value overflows once standardized.
    pub fn encode(&self, record: &AdaptedRecord) -> Result<Vec<f64>, ModelError> {
        let model = &self.model;
        let mut encoded = Vec::with_capacity(model.encoded_width());

        for (i, name) in model.numeric_features.iter().enumerate() {
            let raw = match record.column(name) {
                None => return Err(ModelError::MissingColumn(name.clone())),
                Some(Cell::Number(v)) => v,
                Some(Cell::Category(Observation::Numeric(v))) => *v,
                Some(Cell::Category(Observation::Text(text))) => {
                    return Err(ModelError::TypeMismatch {
                        column: name.clone(),
                        reason: format!("could not convert string to float: {text:?}"),
                    });
                }
            };

            let value = if raw.is_finite() {
                raw
            } else {
                model.numeric_imputer_median[i]
            };
            let scale = if model.scaler_scale[i] == 0.0 {
                1.0
            } else {
                model.scaler_scale[i]
            };
            let scaled = (value - model.scaler_mean[i]) / scale;
            if !scaled.is_finite() {
                return Err(ModelError::InvalidInput(format!(
                    "column {name} contains infinity or a value too large"
                )));
            }
            encoded.push(scaled);
        }

        for (i, name) in model.categorical_features.iter().enumerate() {
            let text = match record.column(name) {
                None => return Err(ModelError::MissingColumn(name.clone())),
                Some(Cell::Category(observation)) => observation.to_string(),
                Some(Cell::Number(v)) => v.to_string(),
            };
            encoded.extend(
                model.categories[i]
                    .iter()
                    .map(|category| if *category == text { 1.0 } else { 0.0 }),
            );
        }

        Ok(encoded)
    }

    /// Probability of class 1 for an encoded vector.
    fn positive_probability(&self, encoded: &[f64]) -> Result<f64, ModelError> {
        if encoded.len() != self.model.coefficients.len() {
            return Err(ModelError::Shape(format!(
                "encoded vector has {} entries, expected {}",
                encoded.len(),
                self.model.coefficients.len()
            )));
        }
        let z = encoded
            .iter()
            .zip(&self.model.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.model.intercept;
        if !z.is_finite() {
            return Err(ModelError::InvalidInput(
                "input contains infinity or a value too large".into(),
            ));
        }
        Ok(sigmoid(z))
    }
}

impl Classifier for PipelineAdapter {
    fn classes(&self) -> &[u8] {
        &self.model.classes
    }

    fn predict(&self, record: &AdaptedRecord) -> Result<u8, ModelError> {
        let proba = self.predict_proba(record)?;
        // Ties resolve to the first class, like an argmax.
        let best = proba
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > proba[best] { i } else { best });
        Ok(self.model.classes[best])
    }

    fn predict_proba(&self, record: &AdaptedRecord) -> Result<Vec<f64>, ModelError> {
        let encoded = self.encode(record)?;
        let p1 = self.positive_probability(&encoded)?;
        Ok(vec![1.0 - p1, p1])
    }
}
