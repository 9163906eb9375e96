use std::sync::LazyLock;

use regex::Regex;

use crate::models::FieldKey;

/// Where a pattern's capture lands in the field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternTarget {
    /// A single range-gated measurement.
    Measurement(FieldKey),
    /// Explicitly labeled systolic reading (`ap_hi`).
    Systolic,
    /// Explicitly labeled diastolic reading (`ap_lo`).
    Diastolic,
    /// `bp 120/80`: group 1 systolic, group 2 diastolic.
    CombinedPressure,
    Gender,
    /// A yes/no lifestyle answer (`smoke`, `alco`, `active`).
    Habit(FieldKey),
}

/// An anchor keyword, a bounded gap of filler characters, then a capture.
pub struct FieldPattern {
    pub target: PatternTarget,
    pub regex: Regex,
    pub description: &'static str,
}

impl FieldPattern {
    /// Capture group 1 of the first match. Expects lower-cased text.
    pub fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Capture groups 1 and 2 of the first match.
    pub fn first_pair<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.regex.captures(text)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }
}

/// Tokens that count as an affirmative lifestyle answer.
pub const POSITIVE_HABIT_TOKENS: &[&str] = &["yes", "active", "smoker", "drinker"];

/// All field patterns in evaluation order. Labeled systolic/diastolic come
/// before the combined pressure pattern so labeled readings win.
pub static FIELD_PATTERNS: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"\b(?:age|years)\b[^\d\n]{0,25}(\d{1,3})",
            PatternTarget::Measurement(FieldKey::Age),
            "age: 'age'/'years' then 1-3 digits",
        ),
        pattern(
            r"\b(?:height|ht)\b[^\d\n]{0,25}(\d{2,3})",
            PatternTarget::Measurement(FieldKey::Height),
            "height: 'height'/'ht' then 2-3 digits",
        ),
        pattern(
            r"\b(?:weight|wt)\b[^\d\n]{0,25}(\d{2,3}(?:\.\d{1,2})?)",
            PatternTarget::Measurement(FieldKey::Weight),
            "weight: 'weight'/'wt' then 2-3 digits, optional decimals",
        ),
        pattern(
            r"\b(?:total\s+)?(?:cholesterol|chol)\b[^\d\n]{0,25}(\d{2,3})",
            PatternTarget::Measurement(FieldKey::Cholesterol),
            "cholesterol: optional 'total', 'cholesterol'/'chol' then 2-3 digits",
        ),
        pattern(
            r"\b(?:glucose|gluc|fasting\s+sugar|fbs)\b[^\d\n]{0,25}(\d{2,3})",
            PatternTarget::Measurement(FieldKey::Glucose),
            "glucose: 'glucose'/'gluc'/'fasting sugar'/'fbs' then 2-3 digits",
        ),
        pattern(
            r"\b(?:systolic|sys\.?)\s*(?:bp|blood\s*pressure)?\b[^\d\n]{0,25}(\d{2,3})",
            PatternTarget::Systolic,
            "systolic: 'systolic'/'sys' then 2-3 digits",
        ),
        pattern(
            r"\b(?:diastolic|dia\.?)\s*(?:bp|blood\s*pressure)?\b[^\d\n]{0,25}(\d{2,3})",
            PatternTarget::Diastolic,
            "diastolic: 'diastolic'/'dia' then 2-3 digits",
        ),
        pattern(
            r"\b(?:bp|blood\s*pressure)\b[^\d\n]{0,25}(\d{2,3})\s*[:/-]\s*(\d{2,3})",
            PatternTarget::CombinedPressure,
            "combined pressure: 'bp'/'blood pressure' then 'x/y'",
        ),
        pattern(
            r"\b(?:gender|sex)\b[^\w\n]{0,25}(male|female|m|f)",
            PatternTarget::Gender,
            "gender: 'gender'/'sex' then male/female/m/f",
        ),
        pattern(
            r"\b(?:smoke|smoking|tobacco)\b[^\w\n]{0,25}(yes|no)",
            PatternTarget::Habit(FieldKey::Smoke),
            "smoke: 'smoke'/'smoking'/'tobacco' then yes/no",
        ),
        pattern(
            r"\b(?:alcohol|liquor)\b[^\w\n]{0,25}(yes|no)",
            PatternTarget::Habit(FieldKey::Alco),
            "alco: 'alcohol'/'liquor' then yes/no",
        ),
        pattern(
            r"\b(?:active|exercise)\b[^\w\n]{0,25}(yes|no)",
            PatternTarget::Habit(FieldKey::Active),
            "active: 'active'/'exercise' then yes/no",
        ),
    ]
});

fn pattern(regex: &str, target: PatternTarget, description: &'static str) -> FieldPattern {
    FieldPattern {
        target,
        regex: Regex::new(regex).expect("Invalid field extraction pattern"),
        description,
    }
}

/// Look up the pattern for one target.
pub fn pattern_for(target: PatternTarget) -> Option<&'static FieldPattern> {
    FIELD_PATTERNS.iter().find(|p| p.target == target)
}
