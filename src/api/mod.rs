// src/api/mod.rs — HTTP API server for itinerary generation

pub mod handlers;
pub mod types;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::orchestrator::Orchestrator;
use crate::infra::config::ApiConfig;
use crate::infra::errors::TripKoiError;

/// Shared state for API handlers.
#[derive(Clone, Default)]
pub struct ApiState {
    /// `None` when no API key is configured; generation routes answer 503.
    pub orchestrator: Option<Arc<Orchestrator>>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Some(Arc::new(orchestrator)),
        }
    }

    fn orchestrator(&self) -> Result<&Orchestrator, TripKoiError> {
        self.orchestrator.as_deref().ok_or(TripKoiError::NoProvider)
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState, config: &ApiConfig) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/itinerary", post(handlers::create_itinerary))
        .route("/api/v1/itinerary/day/{day}", post(handlers::create_day))
        .route("/api/v1/itinerary/remaining", post(handlers::create_remaining))
        .route("/api/v1/itinerary/progressive", post(handlers::create_progressive))
        .route("/api/v1/weather/source", get(handlers::weather_source))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server (blocking).
pub async fn start_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state, config);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
