use crate::application::orchestrator::BatchOrchestrator;
use crate::domain::payout::{BatchRequest, BatchResponse};
use crate::error::BatchError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
}

/// Builds the HTTP router. Malformed JSON is rejected by the `Json`
/// extractor as a client error before the orchestrator runs.
pub fn app(orchestrator: Arc<BatchOrchestrator>) -> Router {
    Router::new()
        .route("/payouts/batch", post(process_batch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { orchestrator })
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

async fn process_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.orchestrator.process_batch(request).await {
        Ok(response) => Ok(Json(response)),
        Err(BatchError::Validation(message)) => {
            Err((StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })))
        }
        Err(BatchError::Storage(err)) => {
            tracing::error!(error = %err, "batch rejected by storage failure");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "storage failure".to_string(),
                }),
            ))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
