//! Report text → validated clinical fields.
//!
//! Each field has its own anchor pattern (see `patterns`). Only the first
//! match per pattern is used; a report is assumed to state each value once.
//! Numeric captures go through the plausibility gate and are dropped, not
//! clamped, when out of range. Nothing here fails: a field that cannot be
//! read is simply absent from the result.

use crate::models::{FieldKey, FieldMapping, FieldValue, Gender};

use super::patterns::{FieldPattern, PatternTarget, FIELD_PATTERNS, POSITIVE_HABIT_TOKENS};
use super::validation::is_valid;

/// Extract every recognizable field from raw OCR text.
pub fn extract_fields(text: &str) -> FieldMapping {
    let text = text.to_lowercase();
    let mut fields = FieldMapping::new();

    for pattern in FIELD_PATTERNS.iter() {
        apply_pattern(pattern, &text, &mut fields);
    }

    tracing::debug!(fields_found = fields.len(), "Report field extraction complete");
    fields
}

fn apply_pattern(pattern: &FieldPattern, text: &str, fields: &mut FieldMapping) {
    match pattern.target {
        PatternTarget::Measurement(key) => record_measurement(pattern, text, key, fields),
        PatternTarget::Systolic => record_measurement(pattern, text, FieldKey::ApHi, fields),
        PatternTarget::Diastolic => record_measurement(pattern, text, FieldKey::ApLo, fields),
        PatternTarget::CombinedPressure => {
            let Some((systolic, diastolic)) = pattern.first_pair(text) else {
                return;
            };
            // Labeled readings already recorded take precedence.
            for (key, raw) in [(FieldKey::ApHi, systolic), (FieldKey::ApLo, diastolic)] {
                if fields.contains(key) {
                    continue;
                }
                if let Some(value) = measurement(key, raw) {
                    fields.insert_if_absent(key, value);
                }
            }
        }
        PatternTarget::Gender => {
            if let Some(token) = pattern.first_capture(text) {
                fields.insert(FieldKey::Gender, Gender::from_ocr_token(token).into());
            }
        }
        PatternTarget::Habit(key) => {
            if let Some(token) = pattern.first_capture(text) {
                fields.insert(key, habit_answer(token));
            }
        }
    }
}

fn record_measurement(
    pattern: &FieldPattern,
    text: &str,
    key: FieldKey,
    fields: &mut FieldMapping,
) {
    if let Some(value) = pattern
        .first_capture(text)
        .and_then(|raw| measurement(key, raw))
    {
        fields.insert(key, value);
    }
}

/// Range-gate and parse one numeric capture.
fn measurement(key: FieldKey, raw: &str) -> Option<FieldValue> {
    if !is_valid(key, raw) {
        tracing::debug!(field = %key, value = raw, "Dropping implausible OCR value");
        return None;
    }
    raw.trim().parse::<f64>().ok().map(FieldValue::Numeric)
}

fn habit_answer(token: &str) -> FieldValue {
    let token = token.to_lowercase();
    if POSITIVE_HABIT_TOKENS.contains(&token.as_str()) {
        FieldValue::from("yes")
    } else {
        FieldValue::from("no")
    }
}
