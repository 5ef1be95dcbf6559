// tests/api_test.rs — Integration test: HTTP routes backed by a mock provider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use tripkoi::api::{build_router, ApiState};
use tripkoi::core::orchestrator::{GenerationSettings, Orchestrator};
use tripkoi::infra::config::ApiConfig;
use tripkoi::infra::errors::TripKoiError;
use tripkoi::provider::fallback::FallbackChain;
use tripkoi::provider::*;

/// Always answers with the same body.
struct FixedProvider {
    content: String,
}

#[async_trait]
impl ModelProvider for FixedProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Fixed"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, TripKoiError> {
        Ok(ChatResponse {
            content: self.content.clone(),
            usage: TokenUsage::default(),
            stop_reason: StopReason::EndTurn,
        })
    }
}

fn app(reply: &str) -> axum::Router {
    let provider = Arc::new(FixedProvider {
        content: reply.to_string(),
    });
    let chain = FallbackChain::pair(provider, ModelRef::new("google", "gemini-2.5-flash"), None);
    let orchestrator = Orchestrator::new(
        chain,
        GenerationSettings {
            backoff: Duration::ZERO,
            ..Default::default()
        },
    );
    build_router(ApiState::new(orchestrator), &ApiConfig::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn kyoto_trip() -> Value {
    json!({
        "city": "교토",
        "startDate": "2026-11-10",
        "endDate": "2026-11-12",
        "peopleCount": 2,
        "totalBudget": "1,200,000원"
    })
}

fn day_reply() -> String {
    json!({
        "title": "아라시야마",
        "stops": [
            {"placeName": "대나무숲", "category": "sightseeing", "lat": 35.017, "lng": 135.671},
            {"placeName": "유도후", "category": "lunch", "lat": 35.015, "lng": 135.677},
            {"placeName": "가이세키", "category": "dinner", "lat": 35.004, "lng": 135.769},
            {"placeName": "료칸 조식", "category": "breakfast", "lat": 35.003, "lng": 135.772}
        ]
    })
    .to_string()
}

// ─── Success paths ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_day_route_returns_sequenced_plan() {
    let resp = app(&day_reply())
        .oneshot(post_json("/api/v1/itinerary/day/2", kyoto_trip()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["currencyCode"], "JPY");
    assert_eq!(body["days"], 3);
    assert_eq!(body["dayPlan"]["day"], 2);
    assert_eq!(body["dayPlan"]["title"], "아라시야마");
    assert_eq!(body["dayPlan"]["stops"][0]["category"], "breakfast");
    assert!(body.get("averageWeather").is_none());
}

#[tokio::test]
async fn test_health_reports_provider() {
    let req = Request::builder()
        .uri("/api/v1/health")
        .body(Body::empty())
        .unwrap();
    let resp = app("{}").oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["provider"], true);
}

// ─── Failure paths ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_exhausted_generation_is_502() {
    let resp = app("I cannot help with that.")
        .oneshot(post_json("/api/v1/itinerary", kyoto_trip()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(resp).await;
    assert_eq!(body["error"], "itinerary generation failed");
    assert_eq!(body["retries"], 3);
    assert!(body["details"].as_str().unwrap().contains("itinerary (3 days)"));
}

#[tokio::test]
async fn test_missing_meal_is_502() {
    let reply = json!({
        "stops": [{"placeName": "금각사", "category": "sightseeing", "lat": 35.039, "lng": 135.729}]
    })
    .to_string();
    let resp = app(&reply)
        .oneshot(post_json("/api/v1/itinerary/day/2", kyoto_trip()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let details = body_json(resp).await["details"].as_str().unwrap().to_string();
    assert!(details.contains("breakfast"), "{details}");
}
