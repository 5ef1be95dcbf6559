// src/core/types.rs — Itinerary domain types
//
// Stops and day plans are deserialized straight from model output, so every
// field tolerates nulls, numeric strings and missing keys.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::currency::CurrencyInfo;
use super::parser::ParseStage;
use super::weather::AverageWeather;

/// Ceiling for any KRW amount read from a request or from model output.
/// Sums of a few thousand capped amounts stay far below `u64::MAX`.
pub const MAX_AMOUNT_KRW: u64 = 1_000_000_000_000;

/// What kind of visit a stop is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "meal-breakfast")]
    Breakfast,
    #[serde(alias = "meal-lunch")]
    Lunch,
    #[serde(alias = "meal-dinner")]
    Dinner,
    Snack,
    Cafe,
    Sightseeing,
    Shopping,
    Activity,
    Nightlife,
    Airport,
    Transfer,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn is_meal(self) -> bool {
        matches!(self, Category::Breakfast | Category::Lunch | Category::Dinner)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Snack => "snack",
            Category::Cafe => "cafe",
            Category::Sightseeing => "sightseeing",
            Category::Shopping => "shopping",
            Category::Activity => "activity",
            Category::Nightlife => "nightlife",
            Category::Airport => "airport",
            Category::Transfer => "transfer",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse part of the day a stop belongs to. Declaration order is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    LateMorning,
    Afternoon,
    Tea,
    Evening,
    Night,
    /// A label the model invented; sorts after every known slot.
    Unknown,
}

impl TimeSlot {
    /// Sort key: morning=1 … night=6, unknown labels last.
    pub fn ordinal(self) -> u8 {
        match self {
            TimeSlot::Morning => 1,
            TimeSlot::LateMorning => 2,
            TimeSlot::Afternoon => 3,
            TimeSlot::Tea => 4,
            TimeSlot::Evening => 5,
            TimeSlot::Night => 6,
            TimeSlot::Unknown => 99,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let slot = match label.trim().to_ascii_lowercase().as_str() {
            "" => return None,
            "morning" => TimeSlot::Morning,
            "late_morning" | "late-morning" => TimeSlot::LateMorning,
            "afternoon" => TimeSlot::Afternoon,
            "tea" => TimeSlot::Tea,
            "evening" => TimeSlot::Evening,
            "night" => TimeSlot::Night,
            _ => TimeSlot::Unknown,
        };
        Some(slot)
    }
}

/// Itemized cost line shown to users. Never used for totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostBreakdownLine {
    pub category: String,
    pub unit_price_local_currency: f64,
    pub quantity: f64,
    pub subtotal_local_currency: f64,
    #[serde(rename = "subtotalKRW")]
    pub subtotal_krw: f64,
    pub confidence: Option<f64>,
}

/// One visit, meal or transfer within a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    #[serde(default, deserialize_with = "null_default")]
    pub place_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cost_reason: String,
    /// KRW per person. Authoritative after cost normalization.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub estimated_cost: u64,
    #[serde(default = "nan", deserialize_with = "lenient_coord")]
    pub lat: f64,
    #[serde(default = "nan", deserialize_with = "lenient_coord")]
    pub lng: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub category: Category,
    #[serde(
        default,
        deserialize_with = "lenient_time_slot",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_slot: Option<TimeSlot>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub cost_breakdown: Vec<CostBreakdownLine>,
}

impl Stop {
    /// Coordinates are finite and inside the real-world lat/lng range.
    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Ordered stops for one calendar day of the trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based day index.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub day: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub day_reason: String,
    #[serde(default, deserialize_with = "null_default")]
    pub stops: Vec<Stop>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub day_total: u64,
}

impl DayPlan {
    pub fn has_category(&self, category: Category) -> bool {
        self.stops.iter().any(|s| s.category == category)
    }

    /// Set `day_total` to the sum of stop costs and return it.
    pub fn recompute_total(&mut self) -> u64 {
        self.day_total = self
            .stops
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.estimated_cost));
        self.day_total
    }
}

/// A complete multi-day plan returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub city: String,
    pub currency: String,
    pub currency_code: String,
    pub currency_symbol: String,
    /// KRW per one unit of local currency.
    pub exchange_rate: f64,
    pub budget_model: String,
    pub days: u32,
    pub day_plans: Vec<DayPlan>,
    pub overall_total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_weather: Option<AverageWeather>,
}

impl Itinerary {
    pub fn new(
        city: impl Into<String>,
        currency: &CurrencyInfo,
        days: u32,
        day_plans: Vec<DayPlan>,
        average_weather: Option<AverageWeather>,
    ) -> Self {
        let mut itinerary = Self {
            city: city.into(),
            currency: currency.name.to_string(),
            currency_code: currency.code.to_string(),
            currency_symbol: currency.symbol.to_string(),
            exchange_rate: currency.krw_rate,
            budget_model: "per_person".into(),
            days,
            day_plans,
            overall_total: 0,
            average_weather,
        };
        itinerary.recompute_totals();
        itinerary
    }

    /// Recompute every day total and the overall total from stop costs.
    pub fn recompute_totals(&mut self) -> u64 {
        self.overall_total = self
            .day_plans
            .iter_mut()
            .map(DayPlan::recompute_total)
            .fold(0u64, u64::saturating_add);
        self.overall_total
    }
}

/// Lifecycle events emitted while a plan is being generated.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    AttemptStarted {
        unit: String,
        attempt: u32,
        max_attempts: u32,
    },
    AttemptFailed {
        unit: String,
        attempt: u32,
        error: String,
        will_retry: bool,
    },
    UnitCompleted {
        unit: String,
        attempts: u32,
        model: String,
        stage: ParseStage,
    },
    /// A day was accepted in progressive mode.
    DayReady {
        day: u32,
        stops: usize,
        day_total: u64,
        spent_so_far: u64,
    },
}

// ─── Lenient deserializers ──────────────────────────────────────────────────

fn nan() -> f64 {
    f64::NAN
}

/// Treat an explicit `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Non-negative integer from a number or a string of digits, capped at
/// `MAX_AMOUNT_KRW`; anything else is 0.
fn integer_from_value(value: &Value) -> u64 {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => crate::util::digits_only(s).unwrap_or(0),
        _ => 0,
    };
    n.min(MAX_AMOUNT_KRW)
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(integer_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = integer_from_value(&Value::deserialize(deserializer)?);
    Ok(u32::try_from(n).unwrap_or(0))
}

/// Number or numeric string; anything unusable becomes NaN and is filtered later.
fn lenient_coord<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let coord = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    Ok(coord)
}

/// Blank or missing labels become `None` so the slot is inferred from the category.
fn lenient_time_slot<'de, D>(deserializer: D) -> Result<Option<TimeSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<Value>::deserialize(deserializer)?;
    Ok(match label {
        Some(Value::String(s)) => TimeSlot::from_label(&s),
        Some(Value::Null) | None => None,
        Some(_) => Some(TimeSlot::Unknown),
    })
}
