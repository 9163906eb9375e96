use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::RiskError;
use crate::models::{FieldKey, FieldMapping, FieldValue, Gender};

/// Fields a decision cannot be made without, in the order they are checked.
/// Gender is optional: an absent gender encodes like any non-female value.
pub const REQUIRED_FIELDS: [FieldKey; 10] = [
    FieldKey::Age,
    FieldKey::Height,
    FieldKey::Weight,
    FieldKey::ApHi,
    FieldKey::ApLo,
    FieldKey::Cholesterol,
    FieldKey::Glucose,
    FieldKey::Smoke,
    FieldKey::Alco,
    FieldKey::Active,
];

/// A request's fields cast to the types the decision pipeline works with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalInput {
    pub age: i64,
    pub gender: Option<Gender>,
    /// cm
    pub height: i64,
    /// kg
    pub weight: f64,
    pub ap_hi: i64,
    pub ap_lo: i64,
    /// mg/dL
    pub cholesterol: i64,
    /// mg/dL
    pub glucose: i64,
    pub smoke: bool,
    pub alco: bool,
    pub active: bool,
}

impl ClinicalInput {
    /// Check that every required field is present, then cast each one.
    ///
    /// Blank strings and numeric zeros count as missing. Integer fields take whole numbers only
    /// (`"72.5"` for height is malformed); lifestyle answers are `yes` in any
    /// case or else `no`.
    pub fn from_mapping(fields: &FieldMapping) -> Result<Self, RiskError> {
        for key in REQUIRED_FIELDS {
            match fields.get(key) {
                Some(value) if !value.is_unset() => {}
                _ => return Err(RiskError::MissingField(key)),
            }
        }

        Ok(Self {
            age: whole_field(fields, FieldKey::Age)?,
            height: whole_field(fields, FieldKey::Height)?,
            weight: decimal_field(fields, FieldKey::Weight)?,
            ap_hi: whole_field(fields, FieldKey::ApHi)?,
            ap_lo: whole_field(fields, FieldKey::ApLo)?,
            cholesterol: whole_field(fields, FieldKey::Cholesterol)?,
            glucose: whole_field(fields, FieldKey::Glucose)?,
            gender: fields
                .get(FieldKey::Gender)
                .filter(|v| !v.is_blank())
                .map(|v| Gender::from_form_value(&v.to_string())),
            smoke: is_yes(fields, FieldKey::Smoke),
            alco: is_yes(fields, FieldKey::Alco),
            active: is_yes(fields, FieldKey::Active),
        })
    }
}

/// Integer view of a value: whole numbers and integer strings only.
pub(crate) fn whole_number(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Numeric(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        FieldValue::Numeric(_) => None,
        FieldValue::Categorical(s) => s.trim().parse::<i64>().ok(),
    }
}

fn whole_field(fields: &FieldMapping, key: FieldKey) -> Result<i64, RiskError> {
    let value = fields.get(key).ok_or(RiskError::MissingField(key))?;
    whole_number(value).ok_or_else(|| RiskError::MalformedField {
        field: key,
        value: value.to_string(),
        reason: "expected a whole number",
    })
}

fn decimal_field(fields: &FieldMapping, key: FieldKey) -> Result<f64, RiskError> {
    let value = fields.get(key).ok_or(RiskError::MissingField(key))?;
    value.as_number().ok_or_else(|| RiskError::MalformedField {
        field: key,
        value: value.to_string(),
        reason: "expected a number",
    })
}

fn is_yes(fields: &FieldMapping, key: FieldKey) -> bool {
    fields
        .get(key)
        .is_some_and(|v| v.to_string().trim().eq_ignore_ascii_case("yes"))
}

/// Which safety rule forced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    HypertensiveCrisis,
    SevereHyperglycemia,
    SevereHypercholesterolemia,
    MorbidObesity,
}

impl OverrideRule {
    pub fn as_str(self) -> &'static str {
        match self {
            OverrideRule::HypertensiveCrisis => "hypertensive_crisis",
            OverrideRule::SevereHyperglycemia => "severe_hyperglycemia",
            OverrideRule::SevereHypercholesterolemia => "severe_hypercholesterolemia",
            OverrideRule::MorbidObesity => "morbid_obesity",
        }
    }
}

/// A verdict forced by the clinical rules, bypassing the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClinicalVerdict {
    pub high_risk: bool,
    /// Percent, 0–100.
    pub confidence: f64,
    pub rule: OverrideRule,
}

/// Number of classifier input columns.
pub const FEATURE_COUNT: usize = 11;

/// Column names the classifier was trained with, in input order.
/// The trailing space in "Age " is part of the trained column name.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age ",
    "Gender",
    "Height",
    "Weight",
    "ap_hi",
    "ap_lo",
    "Cholesterol",
    "Gluc",
    "Smoke",
    "Alco",
    "Active",
];

/// One classifier input row. Position is meaning: the model has no other
/// way to tell columns apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// `(column name, value)` pairs, for logging and debugging.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Raw classifier answer: class label and positive-class probability (0–1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    pub label: i64,
    pub positive_probability: f64,
}

/// What produced a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionBasis {
    ClinicalOverride(OverrideRule),
    Model,
}

/// Final answer: `{"prediction": 0|1, "probability": 0–100}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskDecision {
    pub prediction: u8,
    pub probability: f64,
    #[serde(skip)]
    pub basis: DecisionBasis,
}

/// A completed assessment: what went in and what came out. This is the
/// record a caller stores in its analysis history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub assessed_at: DateTime<Utc>,
    pub input: ClinicalInput,
    pub decision: RiskDecision,
}
