//! Diagnosis result types.
//!
//! Represents the response shape of a chronic kidney disease prediction.

use serde::{Deserialize, Serialize};

use crate::NexusError;

/// Decimal places kept on the reported probability.
pub const PROBABILITY_DECIMALS: i32 = 4;

/// Binary diagnosis selected by the predicted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    /// Class 0 (and anything that is not class 1)
    Healthy,
    /// Class 1
    ChronicKidneyDisease,
}

impl Diagnosis {
    /// Diagnosis for a predicted class label.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::ChronicKidneyDisease
        } else {
            Self::Healthy
        }
    }

    /// Human-readable label returned to callers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy (No CKD)",
            Self::ChronicKidneyDisease => "Chronic Kidney Disease (CKD)",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Round to a fixed number of decimal places (half away from zero).
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Prediction returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = healthy, 1 = CKD
    pub prediction_class: u8,

    /// Label matching `prediction_class`
    pub diagnosis: String,

    /// Probability of the CKD class, 4 decimal places
    pub probability_of_ckd: f64,
}

impl PredictionResult {
    /// Shape a raw classification into the response format.
    ///
    /// The probability is clamped into `[0, 1]` and rounded to
    /// [`PROBABILITY_DECIMALS`] places.
    ///
    /// # Errors
    /// Returns `Internal` if the probability is NaN or infinite.
    pub fn new(prediction_class: u8, positive_probability: f64) -> crate::Result<Self> {
        if !positive_probability.is_finite() {
            return Err(NexusError::Internal(format!(
                "classifier produced a non-finite probability ({positive_probability})"
            )));
        }
        Ok(Self {
            prediction_class,
            diagnosis: Diagnosis::from_class(prediction_class).label().to_string(),
            probability_of_ckd: round_to(positive_probability.clamp(0.0, 1.0), PROBABILITY_DECIMALS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnosis_label_follows_class() {
        assert_eq!(
            PredictionResult::new(1, 0.9).expect("result").diagnosis,
            "Chronic Kidney Disease (CKD)"
        );
        assert_eq!(PredictionResult::new(0, 0.9).expect("result").diagnosis, "Healthy (No CKD)");
        assert_eq!(Diagnosis::from_class(7), Diagnosis::Healthy);
    }

    #[test]
    fn test_probability_rounding() {
        let result = PredictionResult::new(1, 0.876_543_21).expect("result");
        assert!((result.probability_of_ckd - 0.8765).abs() < 1e-12);

        let result = PredictionResult::new(0, 0.000_049).expect("result");
        assert_eq!(result.probability_of_ckd, 0.0);

        let result = PredictionResult::new(0, 0.123_45).expect("result");
        let scaled = result.probability_of_ckd * 1e4;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn test_probability_clamped() {
        assert_eq!(PredictionResult::new(1, 1.2).expect("result").probability_of_ckd, 1.0);
        assert_eq!(PredictionResult::new(0, -0.1).expect("result").probability_of_ckd, 0.0);
    }

    #[test]
    fn test_non_finite_probability_refused() {
        for p in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = PredictionResult::new(0, p).expect_err("must fail");
            assert!(matches!(err, NexusError::Internal(_)));
        }
    }

    #[test]
    fn test_response_field_names() {
        let value = serde_json::to_value(PredictionResult::new(1, 0.5).expect("result")).expect("serialize");
        assert_eq!(value["prediction_class"], 1);
        assert_eq!(value["diagnosis"], "Chronic Kidney Disease (CKD)");
        assert_eq!(value["probability_of_ckd"], 0.5);
    }
}
