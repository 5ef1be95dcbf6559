// src/core/weather.rs — Weather side-channel types and forecast window

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::infra::errors::TripKoiError;

/// Real-time forecasts are only available this many days ahead.
pub const REAL_TIME_WINDOW_DAYS: i64 = 5;

/// Monthly climate averages the model reports alongside day 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AverageWeather {
    pub month: u32,
    pub temp_high: f64,
    pub temp_low: f64,
    /// Monthly precipitation in mm.
    pub precipitation: f64,
    pub rainy_days: u32,
    pub season: String,
    pub tip: String,
}

/// Shape returned by the external forecast lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub temp_high: f64,
    pub temp_low: f64,
    pub precipitation_probability: f64,
    pub is_real_time: bool,
}

impl Forecast {
    /// Stand-in built from monthly averages for dates past the real-time window.
    pub fn from_average(avg: &AverageWeather) -> Self {
        Self {
            temp_high: avg.temp_high,
            temp_low: avg.temp_low,
            precipitation_probability: rain_chance(avg),
            is_real_time: false,
        }
    }
}

/// Percent of days in the month with rain, capped at 100.
fn rain_chance(avg: &AverageWeather) -> f64 {
    (f64::from(avg.rainy_days) / 30.0 * 100.0).round().min(100.0)
}

/// Where weather for a travel date should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ForecastSource {
    RealTime {
        #[serde(rename = "daysAhead")]
        days_ahead: i64,
    },
    Average {
        #[serde(rename = "daysAhead")]
        days_ahead: i64,
    },
}

impl ForecastSource {
    pub fn days_ahead(&self) -> i64 {
        match self {
            ForecastSource::RealTime { days_ahead } | ForecastSource::Average { days_ahead } => {
                *days_ahead
            }
        }
    }

    pub fn is_real_time(&self) -> bool {
        matches!(self, ForecastSource::RealTime { .. })
    }
}

/// Decide between a real-time forecast and the averageWeather fallback.
pub fn forecast_source(travel_date: NaiveDate, today: NaiveDate) -> Result<ForecastSource, TripKoiError> {
    let days_ahead = (travel_date - today).num_days();
    match days_ahead {
        d if d < 0 => Err(TripKoiError::ForecastOutOfRange { days_ahead: d }),
        d if d <= REAL_TIME_WINDOW_DAYS => Ok(ForecastSource::RealTime { days_ahead: d }),
        d => Ok(ForecastSource::Average { days_ahead: d }),
    }
}

/// Pull `averageWeather` out of a parsed model object. A malformed block is
/// ignored rather than failing the day.
pub fn extract_average(value: &serde_json::Value) -> Option<AverageWeather> {
    let raw = value.get("averageWeather")?;
    match serde_json::from_value(raw.clone()) {
        Ok(avg) => Some(avg),
        Err(e) => {
            tracing::debug!("averageWeather ignored: {}", e);
            None
        }
    }
}
