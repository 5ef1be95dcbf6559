// src/core/trip.rs — Caller request and the numbers derived from it

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::currency::{self, CurrencyInfo};
use super::types::MAX_AMOUNT_KRW;
use crate::infra::errors::TripKoiError;
use crate::util::{digits_only, leading_int};

/// Generation request as it arrives from the CLI or the HTTP API.
///
/// `people` and `budget` are free text ("2명", "1,500,000원") and are
/// normalized by [`TripContext::from_request`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, alias = "peopleCount", deserialize_with = "free_text")]
    pub people: String,
    #[serde(default, alias = "totalBudget", deserialize_with = "free_text")]
    pub budget: String,
}

/// Everything the prompts and post-processing need, derived once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct TripContext {
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub people: u32,
    /// Total trip budget in KRW.
    pub total_budget: u64,
    pub budget_per_person: u64,
    pub daily_budget: u64,
    pub travel_month: u32,
    pub currency: CurrencyInfo,
}

impl TripContext {
    pub fn from_request(req: &TripRequest) -> Result<Self, TripKoiError> {
        let city = req.city.trim();
        if city.is_empty() {
            return Err(TripKoiError::InvalidRequest("city is required".into()));
        }
        let start_date = parse_date("startDate", &req.start_date)?;
        let end_date = parse_date("endDate", &req.end_date)?;

        let days = inclusive_days(start_date, end_date);
        let people = leading_int(&req.people)
            .filter(|&n| n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1);
        let total_budget = parse_budget(&req.budget)?;
        let budget_per_person = div_round(total_budget, u64::from(people));
        let daily_budget = div_round(budget_per_person, u64::from(days));

        Ok(Self {
            city: city.to_string(),
            start_date,
            end_date,
            days,
            people,
            total_budget,
            budget_per_person,
            daily_budget,
            travel_month: start_date.month(),
            currency: currency::resolve(city),
        })
    }

    /// Calendar date of a 1-based trip day.
    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start_date + chrono::Days::new(u64::from(day.saturating_sub(1)))
    }

    pub fn is_final_day(&self, day: u32) -> bool {
        day == self.days
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, TripKoiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TripKoiError::InvalidRequest(format!("{field} must be YYYY-MM-DD, got '{value}'"))
    })
}

/// Inclusive day count, never below 1.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days() + 1;
    u32::try_from(span.max(1)).unwrap_or(u32::MAX)
}

/// Digits of the free-text budget in KRW. No digits means no budget; an
/// amount above `MAX_AMOUNT_KRW` is rejected.
fn parse_budget(value: &str) -> Result<u64, TripKoiError> {
    let has_digits = value.chars().any(|c| c.is_ascii_digit());
    match digits_only(value) {
        Some(n) if n <= MAX_AMOUNT_KRW => Ok(n),
        None if !has_digits => Ok(0),
        _ => Err(TripKoiError::InvalidRequest(format!(
            "totalBudget must be at most {MAX_AMOUNT_KRW} KRW, got '{}'",
            value.trim()
        ))),
    }
}

/// Round-half-up division that cannot overflow.
fn div_round(numerator: u64, denominator: u64) -> u64 {
    let d = denominator.max(1);
    numerator / d + u64::from(numerator % d >= d.div_ceil(2))
}

/// Accept `"2명"`, `2` or `null` for free-text numeric fields.
fn free_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
