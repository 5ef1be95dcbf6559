// src/core/cost.rs — Per-stop cost allocation against a daily budget

use regex::Regex;
use std::sync::OnceLock;

use super::currency::CurrencyInfo;
use super::types::{DayPlan, Itinerary, Stop, MAX_AMOUNT_KRW};

/// Floor for the per-day budget regardless of what the traveler entered.
pub const MIN_DAY_BUDGET: u64 = 60_000;
pub const MIN_PER_STOP: u64 = 3_000;
pub const MAX_PER_STOP: u64 = 180_000;

/// Front-loaded shares for days with 1–5 stops. Longer days split evenly.
const WEIGHT_SETS: &[&[f64]] = &[
    &[1.0],
    &[0.55, 0.45],
    &[0.4, 0.35, 0.25],
    &[0.35, 0.3, 0.2, 0.15],
    &[0.3, 0.25, 0.2, 0.15, 0.1],
];

/// Minimum cost (KRW) for places whose name contains the keyword.
const PLACE_FLOORS: &[(&str, u64)] = &[
    ("유니버설", 120_000),
    ("성", 8_000),
    ("타워", 8_000),
    ("시장", 7_000),
    ("거리", 7_000),
];

/// Daily budget for a trip: `max(MIN_DAY_BUDGET, floor(budget / days))`.
pub fn day_budget(budget: u64, day_count: u32) -> u64 {
    (budget / u64::from(day_count.max(1))).max(MIN_DAY_BUDGET)
}

fn weights_for(stop_count: usize) -> Vec<f64> {
    match WEIGHT_SETS.get(stop_count.wrapping_sub(1)) {
        Some(set) => set.to_vec(),
        None => vec![1.0 / stop_count as f64; stop_count],
    }
}

/// Raise `cost` to the floor of any keyword found in `place_name`. Never lowers it.
fn apply_place_floor(cost: f64, place_name: &str) -> f64 {
    let name = place_name.to_lowercase();
    PLACE_FLOORS
        .iter()
        .filter(|(keyword, _)| name.contains(keyword))
        .fold(cost, |acc, (_, floor)| acc.max(*floor as f64))
}

/// Clamp to [MIN_PER_STOP, MAX_PER_STOP] and round to the nearest 100.
fn clamp_cost(cost: f64) -> u64 {
    let clamped = cost.clamp(MIN_PER_STOP as f64, MAX_PER_STOP as f64);
    ((clamped / 100.0).round() * 100.0) as u64
}

/// Overwrite each stop's cost so the day lands on `day_budget`, returning the day total.
///
/// Weighted shares first, then place floors, clamp and round, then one rescale
/// pass that is clamped and rounded again. The total can drift from the budget
/// by up to 100 per stop, more when the clamp bounds bite.
pub fn normalize_day(stops: &mut [Stop], day_budget: u64) -> u64 {
    if stops.is_empty() {
        return 0;
    }

    let weights = weights_for(stops.len());
    let weight_sum: f64 = weights.iter().sum();
    let budget = day_budget as f64;

    for (stop, weight) in stops.iter_mut().zip(&weights) {
        let base = (weight / weight_sum * budget).round();
        stop.estimated_cost = clamp_cost(apply_place_floor(base, &stop.place_name));
    }

    let current: u64 = stops.iter().map(|s| s.estimated_cost).sum();
    let scale = if current > 0 {
        budget / current as f64
    } else {
        1.0
    };

    for stop in stops.iter_mut() {
        stop.estimated_cost = clamp_cost(stop.estimated_cost as f64 * scale);
    }

    stops.iter().map(|s| s.estimated_cost).sum()
}

/// Normalize every day against the per-day share of `budget`.
///
/// The orchestrator passes the per-person budget since stop costs are per person.
pub fn normalize_itinerary(itinerary: &mut Itinerary, budget: u64, day_count: u32) {
    let per_day = day_budget(budget, day_count);
    for day in &mut itinerary.day_plans {
        normalize_day(&mut day.stops, per_day);
    }
    let total = itinerary.recompute_totals();
    tracing::debug!(day_budget = per_day, overall_total = total, "Costs normalized");
}

// ─── Quoted costs ───────────────────────────────────────────────────────────

fn krw_tail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"→\s*([\d,]+)\s*원(?:\s*\(1인\))?[.\s]*$").expect("KRW pattern is valid")
    })
}

/// Reads KRW amounts out of `costReason` text for one currency.
///
/// The local-currency pattern is compiled once and reused for every stop.
pub struct QuoteReader<'a> {
    currency: &'a CurrencyInfo,
    local: Option<Regex>,
}

impl<'a> QuoteReader<'a> {
    pub fn new(currency: &'a CurrencyInfo) -> Self {
        let pattern = format!(r"=\s*([\d,]+(?:\.\d+)?)\s*{}", regex::escape(currency.name));
        Self {
            currency,
            local: Regex::new(&pattern).ok(),
        }
    }

    /// KRW amount quoted in a reason like "… = 1,000엔 → 1엔=9.5원 → 9,500원(1인)".
    ///
    /// Falls back to "= X<currency name>" converted at the currency's rate.
    /// Amounts are capped at `MAX_AMOUNT_KRW`.
    pub fn krw(&self, text: &str) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(caps) = krw_tail().captures(text) {
            return crate::util::digits_only(&caps[1]).map(|n| n.min(MAX_AMOUNT_KRW));
        }

        let caps = self.local.as_ref()?.captures(text)?;
        let amount: f64 = caps[1].replace(',', "").parse().ok()?;
        Some(self.currency.to_krw(amount).min(MAX_AMOUNT_KRW))
    }
}

/// Take each stop's cost from its quoted reason when one is present.
///
/// Stops without a readable quote keep the model's estimate. Returns how many
/// stops were quoted; the day total is recomputed.
pub fn apply_quoted_day(day: &mut DayPlan, quotes: &QuoteReader<'_>) -> usize {
    let mut quoted = 0;
    for stop in &mut day.stops {
        if let Some(krw) = quotes.krw(&stop.cost_reason) {
            stop.estimated_cost = krw;
            quoted += 1;
        }
    }
    day.recompute_total();
    quoted
}

/// [`apply_quoted_day`] for every day, then total up.
pub fn apply_quoted_costs(itinerary: &mut Itinerary, currency: &CurrencyInfo) {
    let quotes = QuoteReader::new(currency);
    let quoted: usize = itinerary
        .day_plans
        .iter_mut()
        .map(|day| apply_quoted_day(day, &quotes))
        .sum();
    let total = itinerary.recompute_totals();
    tracing::debug!(quoted, overall_total = total, "Quoted costs applied");
}
