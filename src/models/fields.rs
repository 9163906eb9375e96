//! Typed clinical fields shared by extraction and risk decision.
//!
//! A report yields at most one value per `FieldKey`. Numeric keys carry a
//! measurement, categorical keys a normalized label. Absent keys mean
//! "unknown", never zero.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A key name that is not one of the clinical fields.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown field: {0}")]
pub struct UnknownFieldKey(pub String);

/// The closed set of clinical fields a report can provide.
///
/// Declaration order is the serialization order of a `FieldMapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Age,
    Height,
    Weight,
    Cholesterol,
    Glucose,
    ApHi,
    ApLo,
    Gender,
    Smoke,
    Alco,
    Active,
}

impl FieldKey {
    pub const ALL: [FieldKey; 11] = [
        FieldKey::Age,
        FieldKey::Height,
        FieldKey::Weight,
        FieldKey::Cholesterol,
        FieldKey::Glucose,
        FieldKey::ApHi,
        FieldKey::ApLo,
        FieldKey::Gender,
        FieldKey::Smoke,
        FieldKey::Alco,
        FieldKey::Active,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Age => "age",
            FieldKey::Height => "height",
            FieldKey::Weight => "weight",
            FieldKey::Cholesterol => "cholesterol",
            FieldKey::Glucose => "glucose",
            FieldKey::ApHi => "ap_hi",
            FieldKey::ApLo => "ap_lo",
            FieldKey::Gender => "gender",
            FieldKey::Smoke => "smoke",
            FieldKey::Alco => "alco",
            FieldKey::Active => "active",
        }
    }

    /// Keys whose value is a measurement rather than a label.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            FieldKey::Gender | FieldKey::Smoke | FieldKey::Alco | FieldKey::Active
        )
    }
}

impl FromStr for FieldKey {
    type Err = UnknownFieldKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(FieldKey::Age),
            "height" => Ok(FieldKey::Height),
            "weight" => Ok(FieldKey::Weight),
            "cholesterol" => Ok(FieldKey::Cholesterol),
            "glucose" => Ok(FieldKey::Glucose),
            "ap_hi" => Ok(FieldKey::ApHi),
            "ap_lo" => Ok(FieldKey::ApLo),
            "gender" => Ok(FieldKey::Gender),
            "smoke" => Ok(FieldKey::Smoke),
            "alco" => Ok(FieldKey::Alco),
            "active" => Ok(FieldKey::Active),
            _ => Err(UnknownFieldKey(s.to_string())),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient sex as the classifier understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Normalize an OCR token (`male`, `female`, `m`, `f`): anything starting
    /// with `m` is male.
    pub fn from_ocr_token(token: &str) -> Self {
        if token.to_lowercase().starts_with('m') {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Normalize a submitted form value: only `female` (any case) is female.
    pub fn from_form_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("female") {
            Gender::Female
        } else {
            Gender::Male
        }
    }
}

/// A single field value: a measurement or a normalized label.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Numeric(f64),
    Categorical(String),
}

impl FieldValue {
    /// Numeric view of the value. Categorical values are parsed, so form
    /// submissions like `"120"` still read as numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric(v) if v.is_finite() => Some(*v),
            FieldValue::Numeric(_) => None,
            FieldValue::Categorical(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Categorical(s) if s.trim().is_empty())
    }

    /// A value a request may carry but that does not answer the field:
    /// a blank string or a numeric zero. The text `"0"` is an answer.
    pub fn is_unset(&self) -> bool {
        match self {
            FieldValue::Numeric(v) => *v == 0.0,
            FieldValue::Categorical(_) => self.is_blank(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Numeric(v) => write!(f, "{v}"),
            FieldValue::Categorical(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Numeric(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Categorical(s.to_string())
    }
}

impl From<Gender> for FieldValue {
    fn from(g: Gender) -> Self {
        FieldValue::Categorical(g.as_str().to_string())
    }
}

/// Validated fields found in one report (or submitted in one request).
///
/// Keys are unique and ordered by `FieldKey`. Values never change once the
/// extractor hands the mapping out; public construction goes through
/// `FromIterator` or `with`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping(BTreeMap<FieldKey, FieldValue>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for assembling requests and fixtures.
    pub fn with(mut self, key: FieldKey, value: impl Into<FieldValue>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub(crate) fn insert(&mut self, key: FieldKey, value: FieldValue) {
        self.0.insert(key, value);
    }

    /// Insert only when the key has no value yet. Returns whether it inserted.
    pub(crate) fn insert_if_absent(&mut self, key: FieldKey, value: FieldValue) -> bool {
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value);
        true
    }
}

impl FromIterator<(FieldKey, FieldValue)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Wire shape: `{"ap_hi": "120", "gender": "Male"}`, every value a string.
impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key.as_str(), &value.to_string())?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

/// Lenient request decoding: numbers and strings are accepted, `null` and
/// unknown keys are skipped.
impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, Option<RawValue>> = BTreeMap::deserialize(deserializer)?;
        let mapping = raw
            .into_iter()
            .filter_map(|(name, value)| {
                let key = name.parse::<FieldKey>().ok()?;
                let value = match value? {
                    RawValue::Number(v) => FieldValue::Numeric(v),
                    RawValue::Text(s) => FieldValue::Categorical(s),
                };
                Some((key, value))
            })
            .collect();
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_key_round_trips_names() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>(), Ok(key));
        }
        assert_eq!(
            "blood_group".parse::<FieldKey>(),
            Err(UnknownFieldKey("blood_group".into()))
        );
    }

    #[test]
    fn categorical_keys_are_not_numeric() {
        let numeric: Vec<_> = FieldKey::ALL.iter().filter(|k| k.is_numeric()).collect();
        assert_eq!(numeric.len(), 7);
        assert!(!FieldKey::Gender.is_numeric());
        assert!(!FieldKey::Active.is_numeric());
    }

    #[test]
    fn gender_normalization_differs_by_source() {
        assert_eq!(Gender::from_ocr_token("m"), Gender::Male);
        assert_eq!(Gender::from_ocr_token("female"), Gender::Female);
        assert_eq!(Gender::from_ocr_token("f"), Gender::Female);
        assert_eq!(Gender::from_form_value("FEMALE"), Gender::Female);
        assert_eq!(Gender::from_form_value("f"), Gender::Male);
    }

    #[test]
    fn numeric_view_parses_form_strings() {
        assert_eq!(FieldValue::from("  120 ").as_number(), Some(120.0));
        assert_eq!(FieldValue::from("abc").as_number(), None);
        assert_eq!(FieldValue::Numeric(f64::NAN).as_number(), None);
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::Numeric(0.0).is_blank());
    }

    #[test]
    fn zero_and_blank_are_unset() {
        assert!(FieldValue::Numeric(0.0).is_unset());
        assert!(FieldValue::from("").is_unset());
        assert!(!FieldValue::from("0").is_unset());
        assert!(!FieldValue::Numeric(0.5).is_unset());
    }

    #[test]
    fn serializes_as_string_map_in_key_order() {
        let mapping = FieldMapping::new()
            .with(FieldKey::Gender, Gender::Female)
            .with(FieldKey::Weight, 72.5)
            .with(FieldKey::ApHi, 120.0);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"weight":"72.5","ap_hi":"120","gender":"Female"}"#);
    }

    #[test]
    fn deserializes_leniently() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{"age": "45", "weight": 70.5, "gender": null, "name": "Kim"}"#,
        )
        .unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get(FieldKey::Age), Some(&FieldValue::from("45")));
        assert_eq!(mapping.get(FieldKey::Weight), Some(&FieldValue::Numeric(70.5)));
        assert!(!mapping.contains(FieldKey::Gender));
    }

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let mut mapping = FieldMapping::new();
        assert!(mapping.insert_if_absent(FieldKey::ApHi, FieldValue::Numeric(150.0)));
        assert!(!mapping.insert_if_absent(FieldKey::ApHi, FieldValue::Numeric(130.0)));
        assert_eq!(mapping.get(FieldKey::ApHi), Some(&FieldValue::Numeric(150.0)));
    }
}
