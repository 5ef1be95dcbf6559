// src/core/validate.rs — Shape, coverage and meal checks on parsed model output

use serde_json::Value;
use std::ops::RangeInclusive;

use super::types::{Category, DayPlan};
use crate::infra::errors::OutputError;

/// The slice of the trip one model call is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationUnit {
    /// Every day in a single call.
    Full,
    /// One 1-based day.
    Day(u32),
    /// Days 5..=N in a single call.
    Remaining,
}

/// First day covered by [`GenerationUnit::Remaining`].
pub const REMAINING_FROM: u32 = 5;

impl GenerationUnit {
    /// Day indices this unit must cover.
    pub fn expected_days(&self, total_days: u32) -> RangeInclusive<u32> {
        match self {
            GenerationUnit::Full => 1..=total_days,
            GenerationUnit::Day(n) => *n..=*n,
            GenerationUnit::Remaining => REMAINING_FROM..=total_days,
        }
    }

    /// Top-level array the response must carry.
    pub fn array_field(&self) -> &'static str {
        match self {
            GenerationUnit::Day(_) => "stops",
            GenerationUnit::Full | GenerationUnit::Remaining => "dayPlans",
        }
    }

    pub fn label(&self, total_days: u32) -> String {
        match self {
            GenerationUnit::Full => format!("itinerary ({total_days} days)"),
            GenerationUnit::Day(n) => format!("day {n}"),
            GenerationUnit::Remaining => format!("days {REMAINING_FROM}-{total_days}"),
        }
    }
}

// ─── Meal policy ────────────────────────────────────────────────────────────

const ALL_MEALS: &[Category] = &[Category::Breakfast, Category::Lunch, Category::Dinner];
const DEPARTURE_MEALS: &[Category] = &[Category::Breakfast, Category::Lunch];
const ARRIVAL_MEALS: &[Category] = &[Category::Dinner];

/// Meals each day must contain, by day position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealPolicy {
    unit: GenerationUnit,
    total_days: u32,
}

impl MealPolicy {
    pub fn new(unit: GenerationUnit, total_days: u32) -> Self {
        Self { unit, total_days }
    }

    /// Final day: breakfast and lunch. Day 1 requested on its own for a
    /// multi-day trip is the arrival day and only needs dinner. Every other
    /// day needs all three.
    pub fn required(&self, day: u32) -> &'static [Category] {
        if day == self.total_days {
            DEPARTURE_MEALS
        } else if self.unit == GenerationUnit::Day(1) && day == 1 {
            ARRIVAL_MEALS
        } else {
            ALL_MEALS
        }
    }

    pub fn check(&self, plan: &DayPlan) -> Result<(), OutputError> {
        let missing: Vec<&str> = self
            .required(plan.day)
            .iter()
            .filter(|meal| !plan.has_category(**meal))
            .map(|meal| meal.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OutputError::MissingMeals {
                day: plan.day,
                missing: missing.join(", "),
            })
        }
    }
}

// ─── Shape ──────────────────────────────────────────────────────────────────

/// Turn a parsed object into the day plans `unit` asked for, sorted by day.
///
/// Fails when the required array is missing, when a day cannot be read, or
/// when the day indices are not exactly the expected range.
pub fn extract_day_plans(
    value: &Value,
    unit: GenerationUnit,
    total_days: u32,
) -> Result<Vec<DayPlan>, OutputError> {
    let field = unit.array_field();
    let array = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or(OutputError::MissingField(field))?;

    if let GenerationUnit::Day(n) = unit {
        let stops = serde_json::from_value(Value::Array(array.clone()))
            .map_err(|e| OutputError::Malformed(format!("stops: {e}")))?;
        return Ok(vec![DayPlan {
            day: n,
            title: text_field(value, "title"),
            day_reason: text_field(value, "dayReason"),
            stops,
            day_total: 0,
        }]);
    }

    let mut plans: Vec<DayPlan> = array
        .iter()
        .map(|day| serde_json::from_value(day.clone()))
        .collect::<Result<_, _>>()
        .map_err(|e| OutputError::Malformed(format!("dayPlans: {e}")))?;

    let expected = unit.expected_days(total_days);
    let expected_len = expected.clone().count();
    if plans.len() != expected_len {
        return Err(OutputError::DayCount {
            expected: expected_len,
            actual: plans.len(),
        });
    }

    plans.sort_by_key(|p| p.day);
    let indices: Vec<u32> = plans.iter().map(|p| p.day).collect();
    if !indices.iter().copied().eq(expected.clone()) {
        return Err(OutputError::DayIndices {
            expected: format!("{}..={}", expected.start(), expected.end()),
            actual: indices,
        });
    }

    Ok(plans)
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Give every stop without a reason a sentence built from its name and summary.
pub fn fill_missing_reasons(plan: &mut DayPlan) {
    for stop in plan.stops.iter_mut().filter(|s| s.reason.trim().is_empty()) {
        let summary = if stop.summary.trim().is_empty() {
            "해당 지역의 대표 명소"
        } else {
            stop.summary.trim()
        };
        stop.reason = format!(
            "{}은(는) {}로, 인근 동선과 함께 방문하기 좋습니다.",
            stop.place_name, summary
        );
    }
}
