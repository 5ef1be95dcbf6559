// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::core::orchestrator::DayGeneration;
use crate::core::trip::TripContext;
use crate::core::types::DayPlan;
use crate::core::weather::ForecastSource;

/// Destination and currency fields repeated on every partial response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripHeader {
    pub city: String,
    pub currency: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub exchange_rate: f64,
    pub days: u32,
}

impl From<&TripContext> for TripHeader {
    fn from(ctx: &TripContext) -> Self {
        Self {
            city: ctx.city.clone(),
            currency: ctx.currency.name.to_string(),
            currency_code: ctx.currency.code.to_string(),
            currency_symbol: ctx.currency.symbol.to_string(),
            exchange_rate: ctx.currency.krw_rate,
            days: ctx.days,
        }
    }
}

/// Response for a day-scoped request.
#[derive(Debug, Serialize)]
pub struct DayResponse {
    #[serde(flatten)]
    pub trip: TripHeader,
    #[serde(flatten)]
    pub generated: DayGeneration,
}

/// Response for the remaining-days request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingResponse {
    #[serde(flatten)]
    pub trip: TripHeader,
    pub day_plans: Vec<DayPlan>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherSourceQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherSourceResponse {
    pub date: String,
    #[serde(flatten)]
    pub source: ForecastSource,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}
