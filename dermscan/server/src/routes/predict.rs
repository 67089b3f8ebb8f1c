//! Prediction endpoint
//!
//! `POST /predict` accepts either a `multipart/form-data` body with an
//! `image` field or a JSON body with an `image_url` field, and responds
//! with `{"prediction": "<ClassName>"}`. Invalid input gets a 400 with
//! `{"error": "..."}`.

use axum::extract::multipart::Multipart;
use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use dermscan::DermScanError;

use crate::state::SharedState;

/// JSON request body
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub image_url: Option<String>,
}

/// Successful prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type PredictError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> PredictError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal_error(message: &str) -> PredictError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// POST /predict
pub async fn predict(
    State(state): State<SharedState>,
    request: Request,
) -> Result<Json<PredictResponse>, PredictError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let bytes = if content_type.starts_with("multipart/form-data") {
        image_from_multipart(request, &state).await?
    } else if content_type.starts_with("application/json") {
        image_from_json(request, &state).await?
    } else {
        return Err(bad_request("No image provided"));
    };

    // Inference is CPU-bound, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || state.predictor.predict_bytes(&bytes))
        .await
        .map_err(|e| {
            error!("Prediction task failed: {}", e);
            internal_error("Prediction failed")
        })?
        .map_err(|e| match e {
            DermScanError::InvalidInput(message) => bad_request(&message),
            other => {
                error!("Prediction failed: {}", other);
                internal_error("Prediction failed")
            }
        })?;

    info!(
        prediction = %result.class_name,
        confidence = result.confidence,
        "handled prediction"
    );

    Ok(Json(PredictResponse {
        prediction: result.class_name,
    }))
}

/// Extract image bytes from the `image` field of a multipart body
async fn image_from_multipart(
    request: Request,
    state: &SharedState,
) -> Result<Vec<u8>, PredictError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|_| bad_request("Could not read image field"))?;

        if data.is_empty() {
            return Err(bad_request("No image provided"));
        }
        if data.len() > state.config.max_upload_bytes {
            return Err(bad_request("Image too large"));
        }

        return Ok(data.to_vec());
    }

    Err(bad_request("No image provided"))
}

/// Fetch image bytes from the `image_url` of a JSON body
async fn image_from_json(request: Request, state: &SharedState) -> Result<Vec<u8>, PredictError> {
    let Json(body) = Json::<PredictRequest>::from_request(request, &())
        .await
        .map_err(|_| bad_request("Malformed JSON body"))?;

    let url = match body.image_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => return Err(bad_request("No image provided")),
    };

    let response = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|_| bad_request("Could not fetch image from URL"))?;

    if !response.status().is_success() {
        return Err(bad_request("Could not fetch image from URL"));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|_| bad_request("Could not fetch image from URL"))?;

    if bytes.is_empty() {
        return Err(bad_request("No image provided"));
    }

    Ok(bytes.to_vec())
}
