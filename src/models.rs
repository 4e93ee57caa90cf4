use serde::Serialize;

/// Wire format of a successful prediction.
///
/// `percent[i]` is the classifier's confidence for digit `i`; `result` is
/// the arg-max index of `percent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub result: u8,
    pub percent: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
