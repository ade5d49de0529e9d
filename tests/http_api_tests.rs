mod common;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{ScriptedGateway, orchestrator};
use pix_payouts::application::orchestrator::{BatchOrchestrator, OrchestratorConfig};
use pix_payouts::domain::payout::BatchReport;
use pix_payouts::domain::ports::BatchReportStore;
use pix_payouts::error::{ReportError, StoreError};
use pix_payouts::infrastructure::in_memory::InMemoryPaymentStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let (orchestrator, _) = orchestrator(ScriptedGateway::always_paying());
    pix_payouts::interfaces::http::app(Arc::new(orchestrator))
}

fn post_batch(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payouts/batch")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_post_batch_returns_consolidated_report() {
    let request = post_batch(
        json!({
            "batch_id": "b1",
            "items": [
                {"external_id": "e1", "user_id": "u1", "amount_cents": 1000, "pix_key": "k1"},
                {"external_id": "e2", "user_id": "u2", "amount_cents": 0, "pix_key": "k2"}
            ]
        })
        .to_string(),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["batch_id"], "b1");
    assert_eq!(body["processed"], 2);
    assert_eq!(body["successful"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["duplicates"], 0);
    assert_eq!(body["details"][0]["status"], "paid");
    assert_eq!(body["details"][1]["status"], "failed");
    assert!(body["details"][0].get("error").is_none());
}

#[tokio::test]
async fn test_empty_batch_id_is_a_client_error() {
    let request = post_batch(
        json!({
            "batch_id": "",
            "items": [
                {"external_id": "e1", "user_id": "u1", "amount_cents": 1000, "pix_key": "k1"}
            ]
        })
        .to_string(),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("batch_id"));
}

#[tokio::test]
async fn test_duplicate_within_batch_is_a_client_error() {
    let request = post_batch(
        json!({
            "batch_id": "b1",
            "items": [
                {"external_id": "e1", "user_id": "u1", "amount_cents": 1000, "pix_key": "k1"},
                {"external_id": "e1", "user_id": "u1", "amount_cents": 2000, "pix_key": "k1"}
            ]
        })
        .to_string(),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_never_reaches_the_core() {
    let response = app()
        .oneshot(post_batch("{not json".to_string()))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_report_storage_failure_maps_to_server_error() {
    struct BrokenReportStore;

    #[async_trait]
    impl BatchReportStore for BrokenReportStore {
        async fn get(&self, _batch_id: &str) -> Result<Option<BatchReport>, StoreError> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        async fn create(&self, _report: BatchReport) -> Result<(), ReportError> {
            Err(ReportError::Storage(StoreError::Backend(
                "disk on fire".to_string(),
            )))
        }
    }

    let orchestrator = BatchOrchestrator::new(
        Arc::new(InMemoryPaymentStore::new()),
        Arc::new(BrokenReportStore),
        ScriptedGateway::always_paying(),
        OrchestratorConfig::default(),
    );
    let app = pix_payouts::interfaces::http::app(Arc::new(orchestrator));

    let request = post_batch(
        json!({
            "batch_id": "b1",
            "items": [
                {"external_id": "e1", "user_id": "u1", "amount_cents": 1000, "pix_key": "k1"}
            ]
        })
        .to_string(),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "storage failure");
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
