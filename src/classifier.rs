//! The frozen digit classifier behind a trait seam.
//!
//! `OnnxClassifier` wraps a tract-onnx plan built once at startup and shared
//! read-only across requests. The trait exists so the service and handlers
//! can be exercised with a stub model in tests.

use std::path::Path;

use ndarray::Array4;
use tract_onnx::prelude::*;
use tracing::info;

use crate::error::PredictError;
use crate::preprocess::{INPUT_HEIGHT, INPUT_WIDTH};

/// Number of output classes (digits 0 through 9).
pub const NUM_CLASSES: usize = 10;

/// A frozen classifier mapping a normalized (1, 28, 28, 1) batch to one
/// score per digit class.
///
/// Implementations must be pure given loaded weights: no request may observe
/// another request's state, and repeated calls on the same input must return
/// the same scores.
pub trait DigitClassifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, PredictError>;
}

type RunnablePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Classifier backed by an ONNX graph executed with tract.
#[derive(Debug)]
pub struct OnnxClassifier {
    plan: RunnablePlan,
}

impl OnnxClassifier {
    /// Loads and optimizes the model from `path`, pinning the input to a
    /// single-example (1, 28, 28, 1) f32 fact.
    ///
    /// Any failure here is `ModelLoad` and must abort startup; there is no
    /// fallback model to serve from.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading classifier model");

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(PredictError::model_load)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 1),
                ),
            )
            .map_err(PredictError::model_load)?
            .into_optimized()
            .map_err(PredictError::model_load)?
            .into_runnable()
            .map_err(PredictError::model_load)?;

        info!("classifier model ready");
        Ok(Self { plan })
    }
}

impl DigitClassifier for OnnxClassifier {
    /// Runs one forward pass. tract builds per-call state internally, so
    /// concurrent calls against the shared plan are safe.
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, PredictError> {
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = tract_ndarray::Array4::from_shape_vec(
            (1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 1),
            data,
        )
        .map_err(|e| PredictError::inference("packing input tensor", e))?
        .into_tensor();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| PredictError::inference("forward pass", e))?;

        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| PredictError::inference("reading output tensor", e))?;

        Ok(scores.iter().copied().collect())
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Deterministic stand-in for the ONNX model.
    pub struct StubClassifier {
        pub scores: Vec<f32>,
    }

    impl StubClassifier {
        /// A distribution peaked at `digit`, with the rest of the mass
        /// spread evenly.
        pub fn peaked_at(digit: usize) -> Self {
            let mut scores = vec![0.02; NUM_CLASSES];
            scores[digit] = 0.82;
            Self { scores }
        }
    }

    impl DigitClassifier for StubClassifier {
        fn predict(&self, _input: &Array4<f32>) -> Result<Vec<f32>, PredictError> {
            Ok(self.scores.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_weights_file_is_a_model_load_error() {
        let err = OnnxClassifier::load("no-such-model.onnx").unwrap_err();
        assert!(matches!(err, PredictError::ModelLoad(_)));
    }
}
