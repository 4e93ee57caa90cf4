//! Error taxonomy for the prediction service.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Errors produced by the prediction pipeline.
///
/// `InvalidImage` is the only client-recoverable variant; everything else is
/// either fatal at startup (`ModelLoad`) or a server-side defect.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The payload cannot be decoded as a raster, or its dimensions are
    /// degenerate.
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    /// The classifier weights could not be loaded at startup.
    #[error("failed to load classifier model")]
    ModelLoad(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The forward pass failed or produced an unexpected output shape.
    #[error("inference failed: {context}")]
    Inference {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The configured inference bound expired before a result was produced.
    #[error("inference timed out after {0} ms")]
    Timeout(u64),
}

impl PredictError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        PredictError::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn model_load(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        PredictError::ModelLoad(source.into())
    }

    pub fn inference(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PredictError::Inference {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn inference_msg(context: impl Into<String>) -> Self {
        PredictError::Inference {
            context: context.into(),
            source: None,
        }
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::InvalidImage { .. } => StatusCode::BAD_REQUEST,
            PredictError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PredictError::ModelLoad(_) | PredictError::Inference { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
