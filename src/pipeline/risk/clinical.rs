//! Clinical safety net: catastrophic vitals force a high-risk verdict and the
//! model is never consulted. Rules are checked top to bottom; the first hit
//! wins.
//!
//! A field missing from the input reads as 0 and so never trips its rule.
//! A field that is present but unreadable makes the whole evaluation defer to
//! the model.

use super::types::{whole_number, ClinicalInput, ClinicalVerdict, OverrideRule};
use crate::models::{FieldKey, FieldMapping};

/// Systolic pressure above this is a hypertensive crisis (mmHg).
pub const CRISIS_SYSTOLIC: i64 = 180;
/// Diastolic pressure above this is a hypertensive crisis (mmHg).
pub const CRISIS_DIASTOLIC: i64 = 120;
/// Severe hyperglycemia (mg/dL).
pub const SEVERE_GLUCOSE: i64 = 220;
/// Severe hypercholesterolemia (mg/dL).
pub const SEVERE_CHOLESTEROL: i64 = 300;
/// Morbid obesity (kg/m²).
pub const MORBID_BMI: f64 = 40.0;

/// The vitals the rules look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClinicalVitals {
    pub cholesterol: i64,
    pub glucose: i64,
    pub ap_hi: i64,
    pub ap_lo: i64,
    pub weight: f64,
    pub height: i64,
}

impl ClinicalVitals {
    /// Read vitals from a possibly partial mapping. Missing fields are 0;
    /// `None` when a present field cannot be read as the expected number.
    pub fn from_mapping(fields: &FieldMapping) -> Option<Self> {
        let whole = |key| match fields.get(key) {
            None => Some(0),
            Some(value) => whole_number(value),
        };
        let weight = match fields.get(FieldKey::Weight) {
            None => 0.0,
            Some(value) => value.as_number()?,
        };

        Some(Self {
            cholesterol: whole(FieldKey::Cholesterol)?,
            glucose: whole(FieldKey::Glucose)?,
            ap_hi: whole(FieldKey::ApHi)?,
            ap_lo: whole(FieldKey::ApLo)?,
            weight,
            height: whole(FieldKey::Height)?,
        })
    }

    /// Body mass index, or 0 when height is unknown.
    pub fn bmi(&self) -> f64 {
        if self.height <= 0 {
            return 0.0;
        }
        let height_m = self.height as f64 / 100.0;
        self.weight / (height_m * height_m)
    }
}

impl From<&ClinicalInput> for ClinicalVitals {
    fn from(input: &ClinicalInput) -> Self {
        Self {
            cholesterol: input.cholesterol,
            glucose: input.glucose,
            ap_hi: input.ap_hi,
            ap_lo: input.ap_lo,
            weight: input.weight,
            height: input.height,
        }
    }
}

/// Evaluate a (possibly partial) field mapping. `None` means "let the model
/// decide".
pub fn evaluate(fields: &FieldMapping) -> Option<ClinicalVerdict> {
    match ClinicalVitals::from_mapping(fields) {
        Some(vitals) => evaluate_vitals(&vitals),
        None => {
            tracing::warn!("Clinical check skipped: unreadable vital sign value");
            None
        }
    }
}

/// Apply the override rules in priority order.
pub fn evaluate_vitals(vitals: &ClinicalVitals) -> Option<ClinicalVerdict> {
    let verdict = if vitals.ap_hi > CRISIS_SYSTOLIC || vitals.ap_lo > CRISIS_DIASTOLIC {
        high_risk(OverrideRule::HypertensiveCrisis, 99.0)
    } else if vitals.glucose > SEVERE_GLUCOSE {
        high_risk(OverrideRule::SevereHyperglycemia, 98.0)
    } else if vitals.cholesterol > SEVERE_CHOLESTEROL {
        high_risk(OverrideRule::SevereHypercholesterolemia, 97.0)
    } else if vitals.bmi() > MORBID_BMI {
        high_risk(OverrideRule::MorbidObesity, 85.0)
    } else {
        return None;
    };

    tracing::info!(
        rule = verdict.rule.as_str(),
        confidence = verdict.confidence,
        "Clinical override triggered"
    );
    Some(verdict)
}

fn high_risk(rule: OverrideRule, confidence: f64) -> ClinicalVerdict {
    ClinicalVerdict {
        high_risk: true,
        confidence,
        rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> ClinicalVitals {
        ClinicalVitals {
            cholesterol: 190,
            glucose: 95,
            ap_hi: 120,
            ap_lo: 80,
            weight: 70.0,
            height: 170,
        }
    }

    fn rule_of(vitals: ClinicalVitals) -> Option<(OverrideRule, f64)> {
        evaluate_vitals(&vitals).map(|v| (v.rule, v.confidence))
    }

    #[test]
    fn normal_vitals_defer_to_model() {
        assert_eq!(evaluate_vitals(&normal()), None);
    }

    #[test]
    fn hypertensive_crisis_thresholds_are_strict() {
        assert_eq!(rule_of(ClinicalVitals { ap_hi: 180, ..normal() }), None);
        assert_eq!(
            rule_of(ClinicalVitals { ap_hi: 181, ..normal() }),
            Some((OverrideRule::HypertensiveCrisis, 99.0))
        );
        assert_eq!(rule_of(ClinicalVitals { ap_lo: 120, ..normal() }), None);
        assert_eq!(
            rule_of(ClinicalVitals { ap_lo: 121, ..normal() }),
            Some((OverrideRule::HypertensiveCrisis, 99.0))
        );
    }

    #[test]
    fn glucose_and_cholesterol_rules() {
        assert_eq!(rule_of(ClinicalVitals { glucose: 220, ..normal() }), None);
        assert_eq!(
            rule_of(ClinicalVitals { glucose: 221, ..normal() }),
            Some((OverrideRule::SevereHyperglycemia, 98.0))
        );
        assert_eq!(rule_of(ClinicalVitals { cholesterol: 300, ..normal() }), None);
        assert_eq!(
            rule_of(ClinicalVitals { cholesterol: 301, ..normal() }),
            Some((OverrideRule::SevereHypercholesterolemia, 97.0))
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let everything_bad = ClinicalVitals {
            cholesterol: 400,
            glucose: 400,
            ap_hi: 200,
            ap_lo: 130,
            weight: 150.0,
            height: 150,
        };
        assert_eq!(rule_of(everything_bad).map(|r| r.0), Some(OverrideRule::HypertensiveCrisis));
        assert_eq!(
            rule_of(ClinicalVitals { ap_hi: 120, ap_lo: 80, ..everything_bad }).map(|r| r.0),
            Some(OverrideRule::SevereHyperglycemia)
        );
        assert_eq!(
            rule_of(ClinicalVitals {
                ap_hi: 120,
                ap_lo: 80,
                glucose: 90,
                ..everything_bad
            })
            .map(|r| r.0),
            Some(OverrideRule::SevereHypercholesterolemia)
        );
    }

    #[test]
    fn morbid_obesity_from_bmi() {
        let vitals = ClinicalVitals { weight: 100.0, height: 150, ..normal() };
        assert!((vitals.bmi() - 44.44).abs() < 0.01);
        assert_eq!(rule_of(vitals), Some((OverrideRule::MorbidObesity, 85.0)));
        // BMI 40 exactly is not above the threshold.
        assert_eq!(rule_of(ClinicalVitals { weight: 90.0, height: 150, ..normal() }), None);
    }

    #[test]
    fn unknown_height_skips_bmi() {
        let vitals = ClinicalVitals { weight: 250.0, height: 0, ..normal() };
        assert_eq!(vitals.bmi(), 0.0);
        assert_eq!(rule_of(vitals), None);
    }

    #[test]
    fn missing_fields_read_as_zero() {
        let fields = FieldMapping::new().with(FieldKey::Weight, 70.0);
        let vitals = ClinicalVitals::from_mapping(&fields).unwrap();
        assert_eq!(vitals, ClinicalVitals { weight: 70.0, ..ClinicalVitals::default() });
        assert_eq!(evaluate(&FieldMapping::new()), None);
    }

    #[test]
    fn partial_mapping_can_still_trigger() {
        let fields = FieldMapping::new().with(FieldKey::ApHi, "190");
        let verdict = evaluate(&fields).unwrap();
        assert!(verdict.high_risk);
        assert_eq!(verdict.confidence, 99.0);
    }

    #[test]
    fn unreadable_field_defers_whole_evaluation() {
        let fields = FieldMapping::new()
            .with(FieldKey::ApHi, "200")
            .with(FieldKey::Cholesterol, "abc");
        assert_eq!(ClinicalVitals::from_mapping(&fields), None);
        assert_eq!(evaluate(&fields), None);
    }

    #[test]
    fn vitals_from_clinical_input() {
        let fields = crate::pipeline::risk::fixtures::complete_mapping();
        let input = ClinicalInput::from_mapping(&fields).unwrap();
        let vitals = ClinicalVitals::from(&input);
        assert_eq!(vitals.ap_hi, 120);
        assert_eq!(vitals.height, 165);
        assert_eq!(evaluate_vitals(&vitals), None);
    }
}
