//! Inference service: Feature adaptation plus the inference gateway.
//!
//! This service coordinates:
//! - Adapting the patient record to the fitted column layout
//! - Invoking the trained pipeline
//! - Shaping the pipeline output into a `PredictionResult`

use std::sync::Arc;

use crate::domain::{AdaptedRecord, PatientRecord, PredictionResult};
use crate::ports::Classifier;
use crate::NexusError;

/// Model availability, fixed at startup.
#[derive(Debug)]
pub enum ModelState<C> {
    /// Pipeline loaded and shared read-only
    Loaded(Arc<C>),
    /// Loading failed; every prediction reports this reason
    Unavailable(String),
}

/// Service for running CKD inference on patient records.
///
/// Holds an immutable handle to the pipeline. Cloning the service is cheap
/// and shares the same handle, so one instance is built at startup and
/// handed to every request.
#[derive(Debug)]
pub struct InferenceService<C>
where
    C: Classifier,
{
    model: ModelState<C>,
}

impl<C> Clone for InferenceService<C>
where
    C: Classifier,
{
    fn clone(&self) -> Self {
        let model = match &self.model {
            ModelState::Loaded(c) => ModelState::Loaded(Arc::clone(c)),
            ModelState::Unavailable(reason) => ModelState::Unavailable(reason.clone()),
        };
        Self { model }
    }
}

impl<C> InferenceService<C>
where
    C: Classifier,
{
    /// Create a service over a loaded pipeline.
    pub fn new(classifier: Arc<C>) -> Self {
        Self {
            model: ModelState::Loaded(classifier),
        }
    }

    /// Create a service whose pipeline failed to load.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            model: ModelState::Unavailable(reason.into()),
        }
    }

    /// Create a service from the outcome of a load attempt.
    ///
    /// A load error is logged and kept as the unavailability reason; it does
    /// not abort startup.
    pub fn from_load_result<E>(result: std::result::Result<C, E>) -> Self
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(classifier) => {
                tracing::info!("Model loaded, prediction endpoint ready");
                Self::new(Arc::new(classifier))
            }
            Err(e) => {
                tracing::error!("Model could not be loaded, predictions disabled: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Whether a pipeline is loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.model, ModelState::Loaded(_))
    }

    fn classifier(&self) -> Result<&C, NexusError> {
        match &self.model {
            ModelState::Loaded(c) => Ok(c.as_ref()),
            ModelState::Unavailable(reason) => Err(NexusError::ModelNotLoaded(reason.clone())),
        }
    }

    /// Run inference on a patient record.
    ///
    /// Performs the full pipeline:
    /// 1. Rename fields and derive `hemo_pcv_ratio` / `risk_score`
    /// 2. Classify with the trained pipeline
    /// 3. Shape label and CKD probability into the response
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` when no pipeline is available, or the
    /// pipeline's error when classification fails.
    pub fn predict(&self, patient: &PatientRecord) -> Result<PredictionResult, NexusError> {
        let classifier = self.classifier()?;

        tracing::debug!("Adapting patient record...");
        let record = AdaptedRecord::from_patient(patient);

        tracing::debug!("Running pipeline...");
        let classification = classifier.classify(&record)?;
        let result =
            PredictionResult::new(classification.label, classification.positive_probability)?;

        tracing::info!(
            "Inference complete: prediction={}, probability_of_ckd={:.4}",
            result.prediction_class,
            result.probability_of_ckd
        );

        Ok(result)
    }

    /// Parse a JSON request body and run inference on it.
    ///
    /// # Errors
    /// Returns `Validation` for bodies that are not a complete patient record,
    /// otherwise the same errors as [`InferenceService::predict`].
    pub fn predict_json(&self, body: &[u8]) -> Result<PredictionResult, NexusError> {
        let patient =
            PatientRecord::parse_json(body).map_err(|e| NexusError::Validation(e.to_string()))?;
        self.predict(&patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pipeline::PipelineAdapter;
    use crate::domain::{sample_record, Diagnosis};
    use crate::ports::ModelError;
    use std::path::Path;

    fn create_test_service() -> InferenceService<PipelineAdapter> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        InferenceService::from_load_result(PipelineAdapter::load(&path, None))
    }

    struct Failing;

    impl Classifier for Failing {
        fn classes(&self) -> &[u8] {
            &[0, 1]
        }

        fn predict(&self, _record: &AdaptedRecord) -> Result<u8, ModelError> {
            Err(ModelError::MissingColumn("risk_score".into()))
        }

        fn predict_proba(&self, _record: &AdaptedRecord) -> Result<Vec<f64>, ModelError> {
            Err(ModelError::MissingColumn("risk_score".into()))
        }
    }

    struct NotANumber;

    impl Classifier for NotANumber {
        fn classes(&self) -> &[u8] {
            &[0, 1]
        }

        fn predict(&self, _record: &AdaptedRecord) -> Result<u8, ModelError> {
            Ok(0)
        }

        fn predict_proba(&self, _record: &AdaptedRecord) -> Result<Vec<f64>, ModelError> {
            Ok(vec![f64::NAN, f64::NAN])
        }
    }

    #[test]
    fn test_inference_pipeline() {
        let service = create_test_service();
        assert!(service.is_ready());

        let result = service.predict(&sample_record()).expect("Should run inference");
        assert!(result.prediction_class <= 1);
        assert!((0.0..=1.0).contains(&result.probability_of_ckd));
        assert_eq!(
            result.diagnosis,
            Diagnosis::from_class(result.prediction_class).label()
        );
    }

    #[test]
    fn test_inference_is_deterministic() {
        let service = create_test_service();
        let first = service.predict(&sample_record()).expect("first");
        let second = service.clone().predict(&sample_record()).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_high_risk_profile() {
        let service = create_test_service();
        let mut patient = sample_record();
        patient.specific_gravity = 1.005;
        patient.albumin = 4.0;
        patient.serum_creatinine = 7.2;
        patient.blood_urea = 150.0;
        patient.hemoglobin = 8.1;
        patient.packed_cell_volume = 24.0;
        patient.red_blood_cell_count = 3.1;
        patient.hypertension = "yes".into();
        patient.diabetes_mellitus = "yes".into();
        patient.pedal_edema = "yes".into();
        patient.anemia = "yes".into();

        let result = service.predict(&patient).expect("predict");
        assert_eq!(result.prediction_class, 1);
        assert_eq!(result.diagnosis, "Chronic Kidney Disease (CKD)");
        assert!(result.probability_of_ckd > 0.5);
    }

    #[test]
    fn test_unavailable_model_fails_every_prediction() {
        let service: InferenceService<PipelineAdapter> =
            InferenceService::from_load_result(PipelineAdapter::load(
                Path::new("does/not/exist.json"),
                None,
            ));
        assert!(!service.is_ready());

        let err = service.predict(&sample_record()).expect_err("must fail");
        assert!(matches!(err, NexusError::ModelNotLoaded(_)));
        assert!(err.to_string().starts_with("Model not loaded"));
    }

    #[test]
    fn test_pipeline_errors_propagate() {
        let service = InferenceService::new(Arc::new(Failing));
        let err = service.predict(&sample_record()).expect_err("must fail");
        assert!(err.to_string().contains("risk_score"));
    }

    #[test]
    fn test_predict_json_rejects_incomplete_record() {
        let service = create_test_service();
        let err = service
            .predict_json(br#"{"Age": 45, "Blood Pressure": 80}"#)
            .expect_err("must fail");
        assert!(matches!(err, NexusError::Validation(_)));

        let err = service.predict_json(b"not json").expect_err("must fail");
        assert!(matches!(err, NexusError::Validation(_)));
    }

    #[test]
    fn test_non_finite_probability_is_an_error() {
        let service = InferenceService::new(Arc::new(NotANumber));
        let err = service.predict(&sample_record()).expect_err("must fail");
        assert!(matches!(err, NexusError::Internal(_)));
    }

    #[test]
    fn test_extreme_values_keep_probability_invariant() {
        let service = create_test_service();
        let extremes = [
            0.0,
            -0.0,
            1e-308,
            -1e-308,
            1e15,
            -1e15,
            1e300,
            -1e300,
            1.7e308,
            -1.7e308,
        ];

        for &value in &extremes {
            for field in ["Specific Gravity", "Hemoglobin", "Packed Cell Volume", "White Blood Cell Count"] {
                let mut body = serde_json::to_value(sample_record()).expect("serialize");
                body[field] = serde_json::json!(value);
                let bytes = serde_json::to_vec(&body).expect("bytes");

                match service.predict_json(&bytes) {
                    Ok(result) => {
                        let p = result.probability_of_ckd;
                        assert!(p.is_finite(), "{field}={value} gave {p}");
                        assert!((0.0..=1.0).contains(&p), "{field}={value} gave {p}");
                        let scaled = p * 1e4;
                        assert!((scaled - scaled.round()).abs() < 1e-6);
                        assert_eq!(
                            result.diagnosis,
                            Diagnosis::from_class(result.prediction_class).label()
                        );
                    }
                    Err(e) => assert!(!e.to_string().is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_overflowing_record_is_rejected() {
        let service = create_test_service();
        let mut patient = sample_record();
        patient.specific_gravity = 1e308;
        patient.hemoglobin = 1e302;
        patient.packed_cell_volume = 0.0;

        let err = service.predict(&patient).expect_err("must fail");
        assert!(matches!(
            err,
            NexusError::Model(ModelError::InvalidInput(_))
        ));
    }
}
