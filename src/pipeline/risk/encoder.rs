// Clinical values → the categorical feature row the classifier was trained on.
// Lab values are bucketed WHO-style (1 normal, 2 above normal, 3 well above).

use super::types::{ClinicalInput, FeatureVector};
use super::RiskError;
use crate::models::{FieldMapping, Gender};

/// Cholesterol (mg/dL): <200 → 1, 200–239 → 2, ≥240 → 3.
pub fn cholesterol_bucket(cholesterol: i64) -> u8 {
    match cholesterol {
        c if c < 200 => 1,
        c if c < 240 => 2,
        _ => 3,
    }
}

/// Fasting glucose (mg/dL): <100 → 1, 100–125 → 2, ≥126 → 3.
pub fn glucose_bucket(glucose: i64) -> u8 {
    match glucose {
        g if g < 100 => 1,
        g if g < 126 => 2,
        _ => 3,
    }
}

/// Female → 2; male or unknown → 1.
pub fn gender_code(gender: Option<Gender>) -> u8 {
    match gender {
        Some(Gender::Female) => 2,
        _ => 1,
    }
}

fn flag(answer: bool) -> f64 {
    if answer {
        1.0
    } else {
        0.0
    }
}

/// Build the classifier row. Order is fixed:
/// age, gender, height, weight, ap_hi, ap_lo, cholesterol bucket,
/// glucose bucket, smoke, alco, active.
pub fn encode(input: &ClinicalInput) -> FeatureVector {
    FeatureVector([
        input.age as f64,
        f64::from(gender_code(input.gender)),
        input.height as f64,
        input.weight,
        input.ap_hi as f64,
        input.ap_lo as f64,
        f64::from(cholesterol_bucket(input.cholesterol)),
        f64::from(glucose_bucket(input.glucose)),
        flag(input.smoke),
        flag(input.alco),
        flag(input.active),
    ])
}

/// Cast a complete mapping and encode it.
pub fn encode_mapping(fields: &FieldMapping) -> Result<FeatureVector, RiskError> {
    ClinicalInput::from_mapping(fields).map(|input| encode(&input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKey;
    use crate::pipeline::risk::fixtures::complete_mapping;

    #[test]
    fn encodes_reference_row_in_order() {
        let row = encode_mapping(&complete_mapping()).unwrap();
        assert_eq!(
            row.as_slice(),
            &[45.0, 2.0, 165.0, 70.0, 120.0, 80.0, 2.0, 1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn cholesterol_bucket_edges() {
        assert_eq!(cholesterol_bucket(199), 1);
        assert_eq!(cholesterol_bucket(200), 2);
        assert_eq!(cholesterol_bucket(239), 2);
        assert_eq!(cholesterol_bucket(240), 3);
    }

    #[test]
    fn glucose_bucket_edges() {
        assert_eq!(glucose_bucket(99), 1);
        assert_eq!(glucose_bucket(100), 2);
        assert_eq!(glucose_bucket(125), 2);
        assert_eq!(glucose_bucket(126), 3);
    }

    #[test]
    fn gender_codes() {
        assert_eq!(gender_code(Some(Gender::Female)), 2);
        assert_eq!(gender_code(Some(Gender::Male)), 1);
        assert_eq!(gender_code(None), 1);
    }

    #[test]
    fn male_smoker_row() {
        let fields = complete_mapping()
            .with(FieldKey::Gender, "male")
            .with(FieldKey::Smoke, "Yes")
            .with(FieldKey::Active, "no")
            .with(FieldKey::Weight, "82.4")
            .with(FieldKey::Cholesterol, "180")
            .with(FieldKey::Glucose, "130");
        let row = encode_mapping(&fields).unwrap();
        assert_eq!(
            row.as_slice(),
            &[45.0, 1.0, 165.0, 82.4, 120.0, 80.0, 1.0, 3.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn incomplete_mapping_is_rejected() {
        let fields = FieldMapping::new().with(FieldKey::Age, "45");
        assert!(matches!(
            encode_mapping(&fields),
            Err(RiskError::MissingField(FieldKey::Height))
        ));
    }
}
