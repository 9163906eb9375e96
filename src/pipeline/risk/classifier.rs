use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{ClassifierOutput, FeatureVector};
use super::ClassifierError;

/// The pretrained risk model, consumed as an opaque scoring service.
///
/// Takes one fixed-order feature row, returns a class label and the
/// positive-class probability in [0, 1].
pub trait RiskClassifier {
    fn infer(&self, features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError>;
}

impl<F> RiskClassifier for F
where
    F: Fn(&FeatureVector) -> Result<ClassifierOutput, ClassifierError>,
{
    fn infer(&self, features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError> {
        self(features)
    }
}

/// Mock classifier for unit testing without a model file.
pub struct MockClassifier {
    output: ClassifierOutput,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(label: i64, positive_probability: f64) -> Self {
        Self {
            output: ClassifierOutput {
                label,
                positive_probability,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RiskClassifier for MockClassifier {
    fn infer(&self, _features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output)
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier (feature `onnx-classifier`)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-classifier")]
mod onnx {
    use super::{ClassifierError, ClassifierOutput, FeatureVector, RiskClassifier};
    use crate::pipeline::risk::types::FEATURE_COUNT;
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Tabular risk model exported to ONNX.
    ///
    /// Expects one float input of shape `[1, 11]` and two outputs: the
    /// predicted label (int64 `[1]`) and class probabilities (float `[1, 2]`).
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires `&mut self`
    /// but the RiskClassifier trait exposes `&self`.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
    }

    impl OnnxClassifier {
        pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
            if !model_path.exists() {
                return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
                .with_intra_threads(1)
                .map_err(|e: ort::Error| ClassifierError::ModelInit(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    ClassifierError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("ONNX risk classifier loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl RiskClassifier for OnnxClassifier {
        fn infer(&self, features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError> {
            use ort::value::TensorRef;

            let row: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
            let input = ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), row)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ClassifierError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;

            require_outputs(outputs.len())?;

            let (_, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| ClassifierError::InvalidOutput(format!("label extraction: {e}")))?;
            let (shape, probabilities) = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(|e| {
                    ClassifierError::InvalidOutput(format!("probability extraction: {e}"))
                })?;

            // Probabilities: [1, 2], column 1 is the positive class.
            if shape.len() != 2 || shape[1] != 2 || probabilities.len() < 2 {
                return Err(ClassifierError::InvalidOutput(format!(
                    "Unexpected probability shape: {shape:?}, expected [1, 2]"
                )));
            }
            let label = labels
                .first()
                .copied()
                .ok_or_else(|| ClassifierError::InvalidOutput("empty label output".into()))?;

            Ok(ClassifierOutput {
                label,
                positive_probability: f64::from(probabilities[1]),
            })
        }
    }

    /// Label and probabilities are read by position.
    fn require_outputs(count: usize) -> Result<(), ClassifierError> {
        if count < 2 {
            return Err(ClassifierError::InvalidOutput(format!(
                "model has {count} output(s), expected label and probabilities"
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn single_output_model_is_an_error() {
            assert!(matches!(require_outputs(0), Err(ClassifierError::InvalidOutput(_))));
            assert!(matches!(require_outputs(1), Err(ClassifierError::InvalidOutput(_))));
            assert!(require_outputs(2).is_ok());
        }

        #[test]
        fn missing_model_file_is_reported() {
            let missing = std::path::Path::new("/nonexistent/risk_model.onnx");
            assert!(matches!(
                OnnxClassifier::load(missing),
                Err(ClassifierError::ModelNotFound(_))
            ));
        }
    }
}

#[cfg(feature = "onnx-classifier")]
pub use onnx::OnnxClassifier;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_counts_calls() {
        let mock = MockClassifier::new(1, 0.73);
        let row = FeatureVector([0.0; 11]);
        let out = mock.infer(&row).unwrap();
        assert_eq!(out.label, 1);
        assert_eq!(out.positive_probability, 0.73);
        mock.infer(&row).unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn closures_are_classifiers() {
        let by_age = |row: &FeatureVector| {
            Ok::<_, ClassifierError>(ClassifierOutput {
                label: i64::from(row.0[0] > 50.0),
                positive_probability: row.0[0] / 100.0,
            })
        };
        let out = by_age.infer(&FeatureVector([60.0; 11])).unwrap();
        assert_eq!(out.label, 1);
        assert!((out.positive_probability - 0.6).abs() < 1e-9);
    }
}
