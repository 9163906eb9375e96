// Plausibility gate for numeric fields read from OCR text.
// OCR regularly splits or drops digits ("1 20" read as "20"); a value outside
// these life-compatible ranges is discarded, never clamped.

use crate::models::FieldKey;

/// Inclusive plausibility range for one numeric field.
struct FieldRange {
    key: FieldKey,
    min: f64,
    max: f64,
}

const FIELD_PLAUSIBILITY: &[FieldRange] = &[
    FieldRange { key: FieldKey::ApHi, min: 60.0, max: 300.0 },
    FieldRange { key: FieldKey::ApLo, min: 30.0, max: 200.0 },
    FieldRange { key: FieldKey::Cholesterol, min: 80.0, max: 900.0 },
    FieldRange { key: FieldKey::Glucose, min: 40.0, max: 700.0 },
    FieldRange { key: FieldKey::Age, min: 1.0, max: 120.0 },
    FieldRange { key: FieldKey::Weight, min: 20.0, max: 300.0 },
    FieldRange { key: FieldKey::Height, min: 50.0, max: 250.0 },
];

/// Check a raw captured value against the field's range.
///
/// Unparsable input is invalid. Keys without a range (the categorical ones)
/// are accepted here; their shape is enforced by the extraction patterns.
pub fn is_valid(key: FieldKey, raw: &str) -> bool {
    match raw.trim().parse::<f64>() {
        Ok(value) => is_valid_number(key, value),
        Err(_) => false,
    }
}

/// Numeric form of [`is_valid`]. NaN is never in range.
pub fn is_valid_number(key: FieldKey, value: f64) -> bool {
    match plausible_range(key) {
        Some((min, max)) => (min..=max).contains(&value),
        None => true,
    }
}

/// `(min, max)` for range-gated keys.
pub fn plausible_range(key: FieldKey) -> Option<(f64, f64)> {
    FIELD_PLAUSIBILITY
        .iter()
        .find(|r| r.key == key)
        .map(|r| (r.min, r.max))
}
