//! Final risk decision: clinical rules first, the model only when no rule
//! fires.
//!
//! ```text
//! FieldMapping ─cast─▶ ClinicalInput ─▶ clinical rules ─verdict─▶ RiskDecision
//!                                              │ defer
//!                                              ▼
//!                                     encode ─▶ classifier ─▶ RiskDecision
//! ```

use chrono::Utc;
use uuid::Uuid;

use super::classifier::RiskClassifier;
use super::clinical::{evaluate_vitals, ClinicalVitals};
use super::encoder::encode;
use super::types::{ClassifierOutput, ClinicalInput, DecisionBasis, RiskAssessment, RiskDecision};
use super::{ClassifierError, RiskError};
use crate::models::FieldMapping;

/// Decide cardiovascular risk for one request.
///
/// Missing or malformed required fields refuse the decision before anything
/// else runs. A clinical override verdict is final and the classifier is not
/// called. Classifier failures propagate unchanged; there is no retry.
pub fn decide<C>(fields: &FieldMapping, classifier: &C) -> Result<RiskDecision, RiskError>
where
    C: RiskClassifier + ?Sized,
{
    let input = ClinicalInput::from_mapping(fields)?;
    decide_input(&input, classifier)
}

/// [`decide`] for an already-cast input.
pub fn decide_input<C>(input: &ClinicalInput, classifier: &C) -> Result<RiskDecision, RiskError>
where
    C: RiskClassifier + ?Sized,
{
    if let Some(verdict) = evaluate_vitals(&ClinicalVitals::from(input)) {
        return Ok(RiskDecision {
            prediction: u8::from(verdict.high_risk),
            probability: verdict.confidence,
            basis: DecisionBasis::ClinicalOverride(verdict.rule),
        });
    }

    let features = encode(input);
    tracing::debug!("Invoking risk classifier");
    let output = classifier.infer(&features)?;
    let prediction = checked_label(&output)?;
    let probability = checked_probability(&output)?;

    Ok(RiskDecision {
        prediction,
        probability: round_percent(probability),
        basis: DecisionBasis::Model,
    })
}

/// [`decide`], wrapped into the record a caller keeps in its history.
pub fn assess<C>(fields: &FieldMapping, classifier: &C) -> Result<RiskAssessment, RiskError>
where
    C: RiskClassifier + ?Sized,
{
    let input = ClinicalInput::from_mapping(fields)?;
    let decision = decide_input(&input, classifier)?;
    Ok(RiskAssessment {
        id: Uuid::new_v4(),
        assessed_at: Utc::now(),
        input,
        decision,
    })
}

fn checked_label(output: &ClassifierOutput) -> Result<u8, ClassifierError> {
    match output.label {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(ClassifierError::InvalidOutput(format!(
            "label {other} is not 0 or 1"
        ))),
    }
}

fn checked_probability(output: &ClassifierOutput) -> Result<f64, ClassifierError> {
    let p = output.positive_probability;
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ClassifierError::InvalidOutput(format!(
            "probability {p} outside [0, 1]"
        )))
    }
}

/// Probability (0–1) → percent with two decimals, ties to even.
fn round_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round_ties_even() / 100.0
}
