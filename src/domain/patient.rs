//! Patient record types for chronic kidney disease risk prediction.
//!
//! Based on the UCI Chronic Kidney Disease dataset biomarkers.
//!
//! Callers address fields by their display names (`"Blood Pressure"`), the way
//! the dataset headers are written. Snake-case aliases (`"Blood_Pressure"`,
//! `"blood_pressure"`) are accepted interchangeably.

use serde::{Deserialize, Deserializer, Serialize};

/// A categorical observation as it arrives on the wire.
///
/// Usually a text token (`"yes"`, `"normal"`, `"notpresent"`), but callers
/// that already encode flags as numbers are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// Already-numeric observation (e.g. `1` for "yes")
    Numeric(f64),
    /// Text token
    Text(String),
}

impl From<&str> for Observation {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for Observation {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Numeric(v) => write!(f, "{v}"),
        }
    }
}

/// Accept a JSON number or a numeric string for a measurement field.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => Ok(v),
        NumberOrText::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("invalid number {s:?}: expected a float"))
        }),
    }
}

/// Biomarker panel for one patient, in its external (display-name) form.
///
/// Every field is required. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    /// Age in years
    #[serde(rename = "Age", alias = "age", deserialize_with = "lenient_f64")]
    pub age: f64,

    /// Diastolic blood pressure in mm/Hg
    #[serde(
        rename = "Blood Pressure",
        alias = "Blood_Pressure",
        alias = "blood_pressure",
        deserialize_with = "lenient_f64"
    )]
    pub blood_pressure: f64,

    /// Urine specific gravity (1.005 - 1.025)
    #[serde(
        rename = "Specific Gravity",
        alias = "Specific_Gravity",
        alias = "specific_gravity",
        deserialize_with = "lenient_f64"
    )]
    pub specific_gravity: f64,

    /// Urine albumin grade (0-5)
    #[serde(rename = "Albumin", alias = "albumin", deserialize_with = "lenient_f64")]
    pub albumin: f64,

    /// Urine sugar grade (0-5)
    #[serde(rename = "Sugar", alias = "sugar", deserialize_with = "lenient_f64")]
    pub sugar: f64,

    /// Red blood cells in urine: normal / abnormal
    #[serde(
        rename = "Red Blood Cells",
        alias = "Red_Blood_Cells",
        alias = "red_blood_cells"
    )]
    pub red_blood_cells: Observation,

    /// Pus cells in urine: normal / abnormal
    #[serde(rename = "Pus Cell", alias = "Pus_Cell", alias = "pus_cell")]
    pub pus_cell: Observation,

    /// Pus cell clumps: present / notpresent
    #[serde(
        rename = "Pus Cell clumps",
        alias = "Pus_Cell_clumps",
        alias = "pus_cell_clumps"
    )]
    pub pus_cell_clumps: Observation,

    /// Bacteria in urine: present / notpresent
    #[serde(rename = "Bacteria", alias = "bacteria")]
    pub bacteria: Observation,

    /// Random blood glucose in mg/dl
    #[serde(
        rename = "Blood Glucose Random",
        alias = "Blood_Glucose_Random",
        alias = "blood_glucose_random",
        deserialize_with = "lenient_f64"
    )]
    pub blood_glucose_random: f64,

    /// Blood urea in mg/dl
    #[serde(
        rename = "Blood Urea",
        alias = "Blood_Urea",
        alias = "blood_urea",
        deserialize_with = "lenient_f64"
    )]
    pub blood_urea: f64,

    /// Serum creatinine in mg/dl
    #[serde(
        rename = "Serum Creatinine",
        alias = "Serum_Creatinine",
        alias = "serum_creatinine",
        deserialize_with = "lenient_f64"
    )]
    pub serum_creatinine: f64,

    /// Sodium in mEq/L
    #[serde(rename = "Sodium", alias = "sodium", deserialize_with = "lenient_f64")]
    pub sodium: f64,

    /// Potassium in mEq/L
    #[serde(rename = "Potassium", alias = "potassium", deserialize_with = "lenient_f64")]
    pub potassium: f64,

    /// Hemoglobin in g/dl
    #[serde(rename = "Hemoglobin", alias = "hemoglobin", deserialize_with = "lenient_f64")]
    pub hemoglobin: f64,

    /// Packed cell volume (%)
    #[serde(
        rename = "Packed Cell Volume",
        alias = "Packed_Cell_Volume",
        alias = "packed_cell_volume",
        deserialize_with = "lenient_f64"
    )]
    pub packed_cell_volume: f64,

    /// White blood cell count in cells/cumm
    #[serde(
        rename = "White Blood Cell Count",
        alias = "White_Blood_Cell_Count",
        alias = "white_blood_cell_count",
        deserialize_with = "lenient_f64"
    )]
    pub white_blood_cell_count: f64,

    /// Red blood cell count in millions/cmm
    #[serde(
        rename = "Red Blood Cell Count",
        alias = "Red_Blood_Cell_Count",
        alias = "red_blood_cell_count",
        deserialize_with = "lenient_f64"
    )]
    pub red_blood_cell_count: f64,

    /// Hypertension: yes / no
    #[serde(rename = "Hypertension", alias = "hypertension")]
    pub hypertension: Observation,

    /// Diabetes mellitus: yes / no
    #[serde(
        rename = "Diabetes Mellitus",
        alias = "Diabetes_Mellitus",
        alias = "diabetes_mellitus"
    )]
    pub diabetes_mellitus: Observation,

    /// Coronary artery disease: yes / no
    #[serde(
        rename = "Coronary Artery Disease",
        alias = "Coronary_Artery_Disease",
        alias = "coronary_artery_disease"
    )]
    pub coronary_artery_disease: Observation,

    /// Appetite: good / poor
    #[serde(rename = "Appetite", alias = "appetite")]
    pub appetite: Observation,

    /// Pedal edema: yes / no
    #[serde(rename = "Pedal Edema", alias = "Pedal_Edema", alias = "pedal_edema")]
    pub pedal_edema: Observation,

    /// Anemia: yes / no
    #[serde(rename = "Anemia", alias = "anemia")]
    pub anemia: Observation,
}

impl PatientRecord {
    /// Parse a record from a JSON request body.
    ///
    /// # Errors
    /// Returns the serde error for malformed JSON, missing fields,
    /// unexpected fields or values that cannot be coerced.
    pub fn parse_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Display names of the biomarker fields, in dataset column order.
pub const FIELD_NAMES: [&str; 24] = [
    "Age",
    "Blood Pressure",
    "Specific Gravity",
    "Albumin",
    "Sugar",
    "Red Blood Cells",
    "Pus Cell",
    "Pus Cell clumps",
    "Bacteria",
    "Blood Glucose Random",
    "Blood Urea",
    "Serum Creatinine",
    "Sodium",
    "Potassium",
    "Hemoglobin",
    "Packed Cell Volume",
    "White Blood Cell Count",
    "Red Blood Cell Count",
    "Hypertension",
    "Diabetes Mellitus",
    "Coronary Artery Disease",
    "Appetite",
    "Pedal Edema",
    "Anemia",
];

/// Reference patient used across unit tests (healthy profile).
#[cfg(test)]
pub(crate) fn sample_record() -> PatientRecord {
    PatientRecord {
        age: 45.0,
        blood_pressure: 80.0,
        specific_gravity: 1.02,
        albumin: 1.0,
        sugar: 0.0,
        red_blood_cells: "normal".into(),
        pus_cell: "normal".into(),
        pus_cell_clumps: "notpresent".into(),
        bacteria: "notpresent".into(),
        blood_glucose_random: 120.0,
        blood_urea: 40.0,
        serum_creatinine: 1.1,
        sodium: 140.0,
        potassium: 4.5,
        hemoglobin: 14.0,
        packed_cell_volume: 44.0,
        white_blood_cell_count: 8000.0,
        red_blood_cell_count: 5.0,
        hypertension: "no".into(),
        diabetes_mellitus: "no".into(),
        coronary_artery_disease: "no".into(),
        appetite: "good".into(),
        pedal_edema: "no".into(),
        anemia: "no".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn display_json() -> serde_json::Value {
        json!({
            "Age": 45, "Blood Pressure": 80, "Specific Gravity": 1.02, "Albumin": 1,
            "Sugar": 0, "Red Blood Cells": "normal", "Pus Cell": "normal",
            "Pus Cell clumps": "notpresent", "Bacteria": "notpresent",
            "Blood Glucose Random": 120, "Blood Urea": 40, "Serum Creatinine": 1.1,
            "Sodium": 140, "Potassium": 4.5, "Hemoglobin": 14, "Packed Cell Volume": 44,
            "White Blood Cell Count": 8000, "Red Blood Cell Count": 5.0,
            "Hypertension": "no", "Diabetes Mellitus": "no",
            "Coronary Artery Disease": "no", "Appetite": "good", "Pedal Edema": "no",
            "Anemia": "no"
        })
    }

    fn parse(value: &serde_json::Value) -> Result<PatientRecord, serde_json::Error> {
        PatientRecord::parse_json(value.to_string().as_bytes())
    }

    #[test]
    fn test_parse_display_names() {
        let record = parse(&display_json()).expect("Should parse");
        assert_eq!(record, sample_record());
    }

    #[test]
    fn test_snake_case_aliases_interchangeable() {
        let mut value = display_json();
        let obj = value.as_object_mut().unwrap();
        let bp = obj.remove("Blood Pressure").unwrap();
        obj.insert("Blood_Pressure".into(), bp);
        let pcv = obj.remove("Packed Cell Volume").unwrap();
        obj.insert("packed_cell_volume".into(), pcv);
        let dm = obj.remove("Diabetes Mellitus").unwrap();
        obj.insert("diabetes_mellitus".into(), dm);

        let record = parse(&value).expect("Should parse aliases");
        assert_eq!(record, sample_record());
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut value = display_json();
        value.as_object_mut().unwrap().remove("Hemoglobin");
        let err = parse(&value).expect_err("Missing field must fail");
        assert!(err.to_string().contains("Hemoglobin"));
    }

    #[test]
    fn test_unexpected_field_rejected() {
        let mut value = display_json();
        value
            .as_object_mut()
            .unwrap()
            .insert("Cholesterol".into(), json!(180));
        let err = parse(&value).expect_err("Unknown field must fail");
        assert!(err.to_string().contains("Cholesterol"));
    }

    #[test]
    fn test_numeric_strings_coerced() {
        let mut value = display_json();
        value["Age"] = json!("45");
        value["Serum Creatinine"] = json!(" 1.1 ");
        let record = parse(&value).expect("Numeric strings coerce");
        assert!((record.age - 45.0).abs() < f64::EPSILON);
        assert!((record.serum_creatinine - 1.1).abs() < f64::EPSILON);

        value["Age"] = json!("forty");
        assert!(parse(&value).is_err());
    }

    #[test]
    fn test_numeric_observation_accepted() {
        let mut value = display_json();
        value["Hypertension"] = json!(1);
        let record = parse(&value).expect("Numeric flag accepted");
        assert_eq!(record.hypertension, Observation::Numeric(1.0));
        assert_eq!(record.hypertension.to_string(), "1");
    }

    #[test]
    fn test_serializes_display_names() {
        let value = serde_json::to_value(sample_record()).expect("serialize");
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), FIELD_NAMES.len());
        for name in FIELD_NAMES {
            assert!(obj.contains_key(name), "missing {name}");
        }
    }
}
