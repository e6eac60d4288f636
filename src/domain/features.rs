//! Feature adaptation: display-name records to the fitted pipeline's layout.
//!
//! The pipeline was fit on the dataset's short column identifiers (`bp`,
//! `hemo`, ...) plus two engineered columns that callers never send:
//! `hemo_pcv_ratio` and `risk_score`. Renaming happens first because the
//! engineered columns are defined over the short identifiers.

use serde::{Deserialize, Serialize};

use super::patient::{Observation, PatientRecord};

/// Guard term in the hemoglobin / packed cell volume denominator.
pub const HEMO_PCV_EPSILON: f64 = 1e-5;

/// Display name to internal column identifier.
pub const RENAMING_TABLE: [(&str, &str); 24] = [
    ("Age", "age"),
    ("Blood Pressure", "bp"),
    ("Specific Gravity", "sg"),
    ("Albumin", "al"),
    ("Sugar", "su"),
    ("Red Blood Cells", "rbc"),
    ("Pus Cell", "pc"),
    ("Pus Cell clumps", "pcc"),
    ("Bacteria", "ba"),
    ("Blood Glucose Random", "bgr"),
    ("Blood Urea", "bu"),
    ("Serum Creatinine", "sc"),
    ("Sodium", "sod"),
    ("Potassium", "pot"),
    ("Hemoglobin", "hemo"),
    ("Packed Cell Volume", "pcv"),
    ("White Blood Cell Count", "wc"),
    ("Red Blood Cell Count", "rc"),
    ("Hypertension", "htn"),
    ("Diabetes Mellitus", "dm"),
    ("Coronary Artery Disease", "cad"),
    ("Appetite", "appet"),
    ("Pedal Edema", "pe"),
    ("Anemia", "ane"),
];

/// Column identifiers of an adapted record, in canonical order.
pub const COLUMN_NAMES: [&str; 26] = [
    "age",
    "bp",
    "sg",
    "al",
    "su",
    "rbc",
    "pc",
    "pcc",
    "ba",
    "bgr",
    "bu",
    "sc",
    "sod",
    "pot",
    "hemo",
    "pcv",
    "wc",
    "rc",
    "htn",
    "dm",
    "cad",
    "appet",
    "pe",
    "ane",
    "hemo_pcv_ratio",
    "risk_score",
];

/// Look up the internal identifier for a display name.
#[must_use]
pub fn short_name(display_name: &str) -> Option<&'static str> {
    RENAMING_TABLE
        .iter()
        .find(|(long, _)| *long == display_name)
        .map(|(_, short)| *short)
}

/// Map an affirmative/negative token to 1/0 for the risk score.
///
/// Recognized tokens are exact and case-sensitive: `yes`, `si`, `ckd` map to 1,
/// `no`, `notckd` map to 0. Any other text maps to 0. Numeric observations
/// pass through unchanged.
#[must_use]
pub fn normalize_flag(observation: &Observation) -> f64 {
    match observation {
        Observation::Numeric(v) => *v,
        Observation::Text(token) => match token.as_str() {
            "yes" | "si" | "ckd" => 1.0,
            _ => 0.0,
        },
    }
}

/// A single value of an adapted record, as the pipeline sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// Numeric column value
    Number(f64),
    /// Categorical column value
    Category(&'a Observation),
}

/// Patient record in the layout the trained pipeline was fit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptedRecord {
    pub age: f64,
    pub bp: f64,
    pub sg: f64,
    pub al: f64,
    pub su: f64,
    pub rbc: Observation,
    pub pc: Observation,
    pub pcc: Observation,
    pub ba: Observation,
    pub bgr: f64,
    pub bu: f64,
    pub sc: f64,
    pub sod: f64,
    pub pot: f64,
    pub hemo: f64,
    pub pcv: f64,
    pub wc: f64,
    pub rc: f64,
    pub htn: Observation,
    pub dm: Observation,
    pub cad: Observation,
    pub appet: Observation,
    pub pe: Observation,
    pub ane: Observation,

    /// `hemo / (pcv + HEMO_PCV_EPSILON)`
    pub hemo_pcv_ratio: f64,

    /// `normalize_flag(htn) + normalize_flag(dm)`
    pub risk_score: f64,
}

impl AdaptedRecord {
    /// Rename a patient record to the internal identifiers and derive the
    /// engineered columns.
    #[must_use]
    pub fn from_patient(patient: &PatientRecord) -> Self {
        let mut record = Self {
            age: patient.age,
            bp: patient.blood_pressure,
            sg: patient.specific_gravity,
            al: patient.albumin,
            su: patient.sugar,
            rbc: patient.red_blood_cells.clone(),
            pc: patient.pus_cell.clone(),
            pcc: patient.pus_cell_clumps.clone(),
            ba: patient.bacteria.clone(),
            bgr: patient.blood_glucose_random,
            bu: patient.blood_urea,
            sc: patient.serum_creatinine,
            sod: patient.sodium,
            pot: patient.potassium,
            hemo: patient.hemoglobin,
            pcv: patient.packed_cell_volume,
            wc: patient.white_blood_cell_count,
            rc: patient.red_blood_cell_count,
            htn: patient.hypertension.clone(),
            dm: patient.diabetes_mellitus.clone(),
            cad: patient.coronary_artery_disease.clone(),
            appet: patient.appetite.clone(),
            pe: patient.pedal_edema.clone(),
            ane: patient.anemia.clone(),
            hemo_pcv_ratio: 0.0,
            risk_score: 0.0,
        };

        record.hemo_pcv_ratio = record.hemo / (record.pcv + HEMO_PCV_EPSILON);
        record.risk_score = normalize_flag(&record.htn) + normalize_flag(&record.dm);
        record
    }

    /// Value of a column by its internal identifier.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Cell<'_>> {
        let cell = match name {
            "age" => Cell::Number(self.age),
            "bp" => Cell::Number(self.bp),
            "sg" => Cell::Number(self.sg),
            "al" => Cell::Number(self.al),
            "su" => Cell::Number(self.su),
            "rbc" => Cell::Category(&self.rbc),
            "pc" => Cell::Category(&self.pc),
            "pcc" => Cell::Category(&self.pcc),
            "ba" => Cell::Category(&self.ba),
            "bgr" => Cell::Number(self.bgr),
            "bu" => Cell::Number(self.bu),
            "sc" => Cell::Number(self.sc),
            "sod" => Cell::Number(self.sod),
            "pot" => Cell::Number(self.pot),
            "hemo" => Cell::Number(self.hemo),
            "pcv" => Cell::Number(self.pcv),
            "wc" => Cell::Number(self.wc),
            "rc" => Cell::Number(self.rc),
            "htn" => Cell::Category(&self.htn),
            "dm" => Cell::Category(&self.dm),
            "cad" => Cell::Category(&self.cad),
            "appet" => Cell::Category(&self.appet),
            "pe" => Cell::Category(&self.pe),
            "ane" => Cell::Category(&self.ane),
            "hemo_pcv_ratio" => Cell::Number(self.hemo_pcv_ratio),
            "risk_score" => Cell::Number(self.risk_score),
            _ => return None,
        };
        Some(cell)
    }

    /// All columns in canonical order.
    #[must_use]
    pub fn columns(&self) -> Vec<(&'static str, Cell<'_>)> {
        COLUMN_NAMES
            .iter()
            .filter_map(|name| self.column(name).map(|cell| (*name, cell)))
            .collect()
    }
}

impl From<&PatientRecord> for AdaptedRecord {
    fn from(patient: &PatientRecord) -> Self {
        Self::from_patient(patient)
    }
}
