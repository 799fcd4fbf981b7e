//! Prediction endpoint.
//!
//! Accepts the canvas drawing as a data URL, normalizes it to the model's
//! input format, and answers with the predicted digit and its confidence.
//! The drawing is validated before the model is touched, so an empty
//! canvas never triggers a model load.

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnist_draw::{normalize_drawing, MnistDrawError};

use crate::error::ApiError;
use crate::state::SharedState;

/// POST /predict request body
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Data-URL-encoded PNG of the canvas (`data:image/png;base64,...`)
    #[serde(default)]
    pub image: Option<String>,
}

/// POST /predict response body
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted digit (0-9)
    pub digit: usize,
    /// Softmax probability of the predicted digit
    pub confidence: f32,
}

/// POST /predict - classify a canvas drawing
pub async fn predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let data_url = request
        .image
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing image field"))?;

    let image = decode_data_url(data_url)?;
    let pixels = normalize_drawing(&image)?;

    let predictor = state.model().await?;
    let prediction = predictor.predict_pixels(&pixels);

    debug!(
        digit = prediction.digit,
        confidence = prediction.confidence,
        "prediction served"
    );

    Ok(Json(PredictResponse {
        digit: prediction.digit,
        confidence: prediction.confidence,
    }))
}

/// Decode a base64 data URL into a grayscale image.
///
/// Accepts both `data:image/png;base64,<payload>` and a bare base64
/// payload.
fn decode_data_url(data_url: &str) -> Result<image::GrayImage, MnistDrawError> {
    let encoded = match data_url.split_once(',') {
        Some((_, payload)) => payload,
        None => data_url,
    };

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| MnistDrawError::InvalidImage(format!("bad base64 payload: {}", e)))?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| MnistDrawError::InvalidImage(format!("undecodable image: {}", e)))?;

    Ok(image.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use image::{DynamicImage, GrayImage, ImageFormat};

    use crate::state::testing::CountingProvider;
    use crate::state::{AppState, ServerConfig};

    fn state_with_counting_provider() -> (SharedState, CountingProvider) {
        let provider = CountingProvider::default();
        let state = Arc::new(AppState::with_provider(
            ServerConfig::default(),
            Box::new(provider.clone()),
        ));
        (state, provider)
    }

    fn data_url(image: &GrayImage) -> String {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            STANDARD.encode(buffer.into_inner())
        )
    }

    fn centered_square_drawing() -> GrayImage {
        let mut image = GrayImage::new(100, 100);
        for y in 30..70 {
            for x in 30..70 {
                image.put_pixel(x, y, image::Luma([255]));
            }
        }
        image
    }

    #[tokio::test]
    async fn test_predict_returns_digit_and_confidence() {
        let (state, _) = state_with_counting_provider();
        let request = PredictRequest {
            image: Some(data_url(&centered_square_drawing())),
        };

        let Json(response) = predict(State(state), Json(request)).await.unwrap();

        assert!(response.digit <= 9);
        assert!((0.0..=1.0).contains(&response.confidence));
    }

    #[tokio::test]
    async fn test_blank_canvas_is_rejected_without_model_load() {
        let (state, provider) = state_with_counting_provider();
        let request = PredictRequest {
            image: Some(data_url(&GrayImage::new(50, 50))),
        };

        let error = predict(State(state), Json(request)).await.unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.message, "no drawing found");
        assert_eq!(provider.load_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let (state, provider) = state_with_counting_provider();
        let request = PredictRequest { image: None };

        let error = predict(State(state), Json(request)).await.unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(provider.load_count(), 0);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_bad_request() {
        let (state, _) = state_with_counting_provider();
        let request = PredictRequest {
            image: Some("data:image/png;base64,@@not-base64@@".to_string()),
        };

        let error = predict(State(state), Json(request)).await.unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_prediction_without_model_file_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(ServerConfig {
            model_path: dir.path().join("mnist_model.mpk"),
            ..Default::default()
        }));
        let request = PredictRequest {
            image: Some(data_url(&centered_square_drawing())),
        };

        let error = predict(State(state), Json(request)).await.unwrap_err();

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "model not ready");
    }

    #[tokio::test]
    async fn test_model_loaded_once_across_requests() {
        let (state, provider) = state_with_counting_provider();

        for _ in 0..5 {
            let request = PredictRequest {
                image: Some(data_url(&centered_square_drawing())),
            };
            predict(State(state.clone()), Json(request)).await.unwrap();
        }

        assert_eq!(provider.load_count(), 1);
    }

    #[test]
    fn test_decode_accepts_bare_base64() {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(centered_square_drawing())
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        let bare = STANDARD.encode(buffer.into_inner());

        let image = decode_data_url(&bare).unwrap();
        assert_eq!(image.dimensions(), (100, 100));
    }
}
