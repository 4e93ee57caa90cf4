//! Request-scoped orchestration: decode, normalize, classify, arg-max.

use tracing::debug;

use crate::classifier::{DigitClassifier, NUM_CLASSES};
use crate::error::PredictError;
use crate::models::PredictionResponse;
use crate::preprocess;

/// Stateless pipeline from uploaded bytes to a prediction.
///
/// Holds only the shared read-only classifier; every intermediate buffer is
/// local to one `handle` call, so concurrent invocations cannot interfere.
pub struct PredictionService<C> {
    classifier: C,
}

impl<C: DigitClassifier> PredictionService<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn handle(&self, bytes: &[u8]) -> Result<PredictionResponse, PredictError> {
        let img = preprocess::decode(bytes)?;
        let tensor = preprocess::normalize(&img)?;
        let percent = self.classifier.predict(&tensor)?;

        if percent.len() != NUM_CLASSES {
            return Err(PredictError::inference_msg(format!(
                "classifier returned {} scores, expected {NUM_CLASSES}",
                percent.len()
            )));
        }

        let result = argmax(&percent) as u8;
        debug!(digit = result, "prediction complete");
        Ok(PredictionResponse { result, percent })
    }
}

/// Index of the largest score. NaN entries never win a comparison, so a
/// defective score vector still yields an in-range index rather than a
/// panic.
fn argmax(scores: &[f32]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &s)| {
            if s > best.1 {
                (i, s)
            } else {
                best
            }
        })
        .0
}
