//! HTTP route handlers.

use std::time::Duration;

use actix_multipart::Multipart;
use actix_web::rt::time;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use tracing::debug;

use crate::classifier::DigitClassifier;
use crate::config::ServerConfig;
use crate::error::PredictError;
use crate::service::PredictionService;

/// Liveness probe.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Accepts a multipart image upload and returns the predicted digit with
/// the full confidence distribution.
///
/// The upload is drained into a request-local buffer, so concurrent
/// requests share nothing but the read-only classifier. The synchronous
/// pipeline runs on the blocking pool, bounded by the configured timeout.
pub async fn predict<C: DigitClassifier + 'static>(
    service: web::Data<PredictionService<C>>,
    config: web::Data<ServerConfig>,
    mut payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let mut data = web::BytesMut::new();

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| PredictError::invalid_image(format!("malformed multipart payload: {e}")))?;

        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| PredictError::invalid_image(format!("truncated upload: {e}")))?;
            if data.len() + chunk.len() > config.max_payload_bytes {
                return Err(PredictError::invalid_image(format!(
                    "payload exceeds {} bytes",
                    config.max_payload_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }
    }

    if data.is_empty() {
        return Err(PredictError::invalid_image("empty payload"));
    }
    debug!(bytes = data.len(), "upload received");

    let bytes = data.freeze();
    let service = service.clone();
    let inference = web::block(move || service.handle(&bytes));

    let timeout_ms = config.inference_timeout_ms;
    let response = match time::timeout(Duration::from_millis(timeout_ms), inference).await {
        Ok(joined) => joined.map_err(|e| PredictError::inference("blocking task canceled", e))??,
        Err(_) => return Err(PredictError::Timeout(timeout_ms)),
    };

    Ok(HttpResponse::Ok().json(response))
}
