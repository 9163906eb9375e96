pub mod types;
pub mod clinical;
pub mod encoder;
pub mod classifier;
pub mod orchestrator;

pub use types::*;
pub use clinical::*;
pub use encoder::*;
pub use classifier::*;
pub use orchestrator::*;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::models::FieldKey;

/// Failures of the external risk classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Classifier initialization: {0}")]
    ModelInit(String),

    #[error("Classifier inference failed: {0}")]
    Inference(String),

    #[error("Classifier returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Why a risk decision was refused.
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Missing {0}. Please fill all fields.")]
    MissingField(FieldKey),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    MalformedField {
        field: FieldKey,
        value: String,
        reason: &'static str,
    },

    #[error("{0}")]
    Classifier(#[from] ClassifierError),
}

/// `{"error": "..."}` body returned to callers instead of a decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&RiskError> for ErrorResponse {
    fn from(err: &RiskError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
