// src/api/handlers.rs — Route handlers for the itinerary API

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::types::*;
use super::ApiState;
use crate::core::trip::{TripContext, TripRequest};
use crate::core::types::Itinerary;
use crate::core::validate::REMAINING_FROM;
use crate::core::weather;
use crate::infra::errors::TripKoiError;

/// Map a pipeline error to a status code and JSON body.
pub fn error_response(e: TripKoiError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, error, retries) = match &e {
        TripKoiError::InvalidRequest(_) | TripKoiError::ForecastOutOfRange { .. } => {
            (StatusCode::BAD_REQUEST, "invalid request", None)
        }
        TripKoiError::GenerationExhausted { attempts, .. } => (
            StatusCode::BAD_GATEWAY,
            "itinerary generation failed",
            Some(*attempts),
        ),
        TripKoiError::NoProvider => (
            StatusCode::SERVICE_UNAVAILABLE,
            "no text-generation provider configured",
            None,
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error", None),
    };
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            details: Some(e.to_string()),
            retries,
        }),
    )
}

fn context(req: &TripRequest) -> Result<TripContext, (StatusCode, Json<ErrorResponse>)> {
    TripContext::from_request(req).map_err(error_response)
}

/// POST /api/v1/itinerary
pub async fn create_itinerary(
    State(state): State<ApiState>,
    Json(req): Json<TripRequest>,
) -> Result<Json<Itinerary>, (StatusCode, Json<ErrorResponse>)> {
    let ctx = context(&req)?;
    let orchestrator = state.orchestrator().map_err(error_response)?;
    orchestrator
        .generate_itinerary(&ctx)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/v1/itinerary/day/{day}
pub async fn create_day(
    State(state): State<ApiState>,
    Path(day): Path<u32>,
    Json(req): Json<TripRequest>,
) -> Result<Json<DayResponse>, (StatusCode, Json<ErrorResponse>)> {
    let ctx = context(&req)?;
    if day == 0 || day > ctx.days {
        return Err(error_response(TripKoiError::InvalidRequest(format!(
            "day must be between 1 and {}",
            ctx.days
        ))));
    }
    let orchestrator = state.orchestrator().map_err(error_response)?;
    let generated = orchestrator
        .generate_day(&ctx, day)
        .await
        .map_err(error_response)?;
    Ok(Json(DayResponse {
        trip: TripHeader::from(&ctx),
        generated,
    }))
}

/// POST /api/v1/itinerary/remaining
pub async fn create_remaining(
    State(state): State<ApiState>,
    Json(req): Json<TripRequest>,
) -> Result<Json<RemainingResponse>, (StatusCode, Json<ErrorResponse>)> {
    let ctx = context(&req)?;
    if ctx.days < REMAINING_FROM {
        return Err(error_response(TripKoiError::InvalidRequest(format!(
            "remaining days are only available for trips of {REMAINING_FROM} days or more"
        ))));
    }
    let orchestrator = state.orchestrator().map_err(error_response)?;
    let day_plans = orchestrator
        .generate_remaining(&ctx)
        .await
        .map_err(error_response)?;
    Ok(Json(RemainingResponse {
        trip: TripHeader::from(&ctx),
        day_plans,
    }))
}

/// POST /api/v1/itinerary/progressive
pub async fn create_progressive(
    State(state): State<ApiState>,
    Json(req): Json<TripRequest>,
) -> Result<Json<Itinerary>, (StatusCode, Json<ErrorResponse>)> {
    let ctx = context(&req)?;
    let orchestrator = state.orchestrator().map_err(error_response)?;
    orchestrator
        .generate_progressive(&ctx)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/v1/weather/source?date=YYYY-MM-DD
pub async fn weather_source(
    Query(query): Query<WeatherSourceQuery>,
) -> Result<Json<WeatherSourceResponse>, (StatusCode, Json<ErrorResponse>)> {
    let date = chrono::NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d").map_err(|_| {
        error_response(TripKoiError::InvalidRequest(format!(
            "date must be YYYY-MM-DD, got '{}'",
            query.date
        )))
    })?;
    let today = chrono::Local::now().date_naive();
    let source = weather::forecast_source(date, today).map_err(error_response)?;
    Ok(Json(WeatherSourceResponse {
        date: date.to_string(),
        source,
    }))
}

/// GET /api/v1/health
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.orchestrator.is_some(),
    }))
}
