//! Process-level configuration, read once at start-up.
//!
//! Every option has a default and is validated when loaded; the decision
//! core itself takes no configuration beyond its fixed clinical constants.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "HeartShield";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_MODEL_PATH: &str = "HEARTSHIELD_MODEL_PATH";
pub const ENV_LOG: &str = "HEARTSHIELD_LOG";
pub const ENV_PDF_DPI: &str = "HEARTSHIELD_PDF_DPI";
pub const ENV_OCR_LANG: &str = "HEARTSHIELD_OCR_LANG";
pub const ENV_OCR_PSM: &str = "HEARTSHIELD_OCR_PSM";

const PDF_DPI_RANGE: (u32, u32) = (72, 600);
const PSM_MAX: u8 = 13;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Get the application data directory (~/HeartShield/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (classifier exports live here)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

pub fn default_model_path() -> PathBuf {
    models_dir().join("risk_model.onnx")
}

pub fn default_log_filter() -> &'static str {
    "heartshield=info"
}

/// Validated runtime options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// Exported risk classifier.
    pub model_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Rasterization resolution for PDF pages.
    pub pdf_dpi: u32,
    /// OCR language spec, e.g. "eng" or "eng+fra".
    pub ocr_language: String,
    /// OCR page segmentation mode.
    pub page_segmentation_mode: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            log_filter: default_log_filter().to_string(),
            pdf_dpi: 200,
            ocr_language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl PipelineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from any variable lookup; unset variables take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_MODEL_PATH) {
            config.model_path = PathBuf::from(non_empty(ENV_MODEL_PATH, path)?);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = non_empty(ENV_LOG, filter)?;
        }
        if let Some(dpi) = lookup(ENV_PDF_DPI) {
            config.pdf_dpi = parse_in_range(ENV_PDF_DPI, &dpi, PDF_DPI_RANGE.0, PDF_DPI_RANGE.1)?;
        }
        if let Some(lang) = lookup(ENV_OCR_LANG) {
            config.ocr_language = parse_language(lang)?;
        }
        if let Some(psm) = lookup(ENV_OCR_PSM) {
            config.page_segmentation_mode = parse_in_range(ENV_OCR_PSM, &psm, 0, PSM_MAX)?;
        }

        Ok(config)
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    Ok(trimmed.to_string())
}

fn parse_in_range<T>(var: &'static str, value: &str, min: T, max: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let parsed: T = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: "not an integer".into(),
    })?;
    if parsed < min || parsed > max {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: format!("expected {min}..={max}"),
        });
    }
    Ok(parsed)
}

fn parse_language(value: String) -> Result<String, ConfigError> {
    let lang = non_empty(ENV_OCR_LANG, value)?;
    let well_formed = lang
        .chars()
        .all(|c| c.is_ascii_lowercase() || c == '_' || c == '+');
    if !well_formed || lang.starts_with('+') || lang.ends_with('+') {
        return Err(ConfigError::InvalidValue {
            var: ENV_OCR_LANG,
            value: lang,
            reason: "expected language codes joined by '+'".into(),
        });
    }
    Ok(lang)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PipelineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.pdf_dpi, 200);
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.page_segmentation_mode, 6);
        assert_eq!(config.log_filter, "heartshield=info");
        assert!(config.model_path.ends_with("risk_model.onnx"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            (ENV_MODEL_PATH, "/srv/models/xgb.onnx"),
            (ENV_PDF_DPI, "300"),
            (ENV_OCR_LANG, "eng+fra"),
            (ENV_OCR_PSM, "4"),
            (ENV_LOG, "heartshield=debug"),
        ])
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/xgb.onnx"));
        assert_eq!(config.pdf_dpi, 300);
        assert_eq!(config.ocr_language, "eng+fra");
        assert_eq!(config.page_segmentation_mode, 4);
        assert_eq!(config.log_filter, "heartshield=debug");
    }

    #[test]
    fn rejects_out_of_range_dpi() {
        let err = load(&[(ENV_PDF_DPI, "20")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: ENV_PDF_DPI, .. }));
        assert!(load(&[(ENV_PDF_DPI, "lots")]).is_err());
    }

    #[test]
    fn rejects_bad_psm_and_language() {
        assert!(load(&[(ENV_OCR_PSM, "14")]).is_err());
        assert!(load(&[(ENV_OCR_LANG, "ENG")]).is_err());
        assert!(load(&[(ENV_OCR_LANG, "eng+")]).is_err());
    }

    #[test]
    fn rejects_empty_strings() {
        assert_eq!(
            load(&[(ENV_MODEL_PATH, "  ")]).unwrap_err(),
            ConfigError::Empty { var: ENV_MODEL_PATH }
        );
    }

    #[test]
    fn model_path_under_app_data() {
        assert!(default_model_path().starts_with(app_data_dir()));
        assert!(app_data_dir().ends_with("HeartShield"));
    }

    #[test]
    fn config_serializes() {
        let json = serde_json::to_string(&PipelineConfig::default()).unwrap();
        assert!(json.contains("\"pdf_dpi\":200"));
        assert!(json.contains("\"ocr_language\":\"eng\""));
    }
}
