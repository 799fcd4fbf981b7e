//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    /// Whether the model record exists on disk
    pub model_present: bool,
}

/// GET /health - liveness and model-availability check
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_present: state.config.model_path.exists(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::state::{AppState, ServerConfig};

    #[tokio::test]
    async fn test_health_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(ServerConfig {
            model_path: dir.path().join("mnist_model.mpk"),
            ..Default::default()
        }));

        let Json(response) = health_check(State(state)).await;

        assert_eq!(response.status, "ok");
        assert!(!response.model_present);
    }
}
