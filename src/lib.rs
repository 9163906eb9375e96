pub mod config;
pub mod models;
pub mod pipeline;

pub use models::{FieldKey, FieldMapping, FieldValue, Gender};
pub use pipeline::extraction::extract_fields;
pub use pipeline::risk::{assess, decide, ErrorResponse, RiskClassifier, RiskDecision, RiskError};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `filter` when set.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing(filter: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_twice_does_not_panic() {
        init_tracing(config::default_log_filter());
        init_tracing("debug");
    }

    #[test]
    fn report_text_to_decision() {
        let text = "Age: 52\nGender: Male\nHeight: 178 cm\nWeight: 81 kg\n\
                    BP: 130/85\nCholesterol: 210\nGlucose: 105\n\
                    Smoking: no\nAlcohol: no\nExercise: yes";
        let fields = extract_fields(text);
        let classifier = pipeline::risk::MockClassifier::new(0, 0.31);
        let decision = decide(&fields, &classifier).unwrap();
        assert_eq!(decision.prediction, 0);
        assert_eq!(decision.probability, 31.0);
    }
}
