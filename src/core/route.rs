// src/core/route.rs — Time-of-day ordering and distance pruning for a day's stops

use haversine::{Location, Units};

use super::types::{Category, Stop, TimeSlot};

/// Slot assumed when a stop arrives without one. Categories not listed fall
/// back to `LateMorning`.
const SLOT_BY_CATEGORY: &[(Category, TimeSlot)] = &[
    (Category::Breakfast, TimeSlot::Morning),
    (Category::Lunch, TimeSlot::Afternoon),
    (Category::Snack, TimeSlot::Tea),
    (Category::Cafe, TimeSlot::Tea),
    (Category::Dinner, TimeSlot::Evening),
    (Category::Nightlife, TimeSlot::Night),
    (Category::Airport, TimeSlot::Morning),
    (Category::Transfer, TimeSlot::Morning),
];

/// Caps applied when sequencing one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLimits {
    pub max_stops: usize,
    pub max_travel_km: f64,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            max_stops: 11,
            max_travel_km: 25.0,
        }
    }
}

impl From<&crate::infra::config::RouteConfig> for RouteLimits {
    fn from(c: &crate::infra::config::RouteConfig) -> Self {
        Self {
            max_stops: c.max_stops,
            max_travel_km: c.max_travel_km,
        }
    }
}

pub fn infer_time_slot(category: Category) -> TimeSlot {
    SLOT_BY_CATEGORY
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, slot)| *slot)
        .unwrap_or(TimeSlot::LateMorning)
}

/// The stop's own slot, or the one implied by its category.
pub fn effective_slot(stop: &Stop) -> TimeSlot {
    stop.time_slot.unwrap_or_else(|| infer_time_slot(stop.category))
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: &Stop, b: &Stop) -> f64 {
    haversine::distance(
        Location {
            latitude: a.lat,
            longitude: a.lng,
        },
        Location {
            latitude: b.lat,
            longitude: b.lng,
        },
        Units::Kilometers,
    )
}

/// Order a day's stops by time slot and drop far-flung non-meal stops.
///
/// Stops without usable coordinates are removed first. The sort is stable, so
/// stops sharing a slot keep the model's order. After truncating to
/// `max_stops`, each candidate is kept while the running distance stays within
/// `max_travel_km`; meals are kept regardless.
pub fn order_day(stops: Vec<Stop>, limits: &RouteLimits) -> Vec<Stop> {
    let before = stops.len();
    let mut stops: Vec<Stop> = stops
        .into_iter()
        .filter(Stop::has_valid_coordinates)
        .collect();
    if stops.len() < before {
        tracing::debug!(dropped = before - stops.len(), "Stops without valid coordinates removed");
    }
    if stops.len() <= 1 {
        return stops;
    }

    stops.sort_by_key(|s| effective_slot(s).ordinal());
    stops.truncate(limits.max_stops.max(1));

    let mut candidates = stops.into_iter();
    let mut kept: Vec<Stop> = candidates.next().into_iter().collect();
    let mut travelled = 0.0;

    for stop in candidates {
        let Some(last) = kept.last() else { break };
        let leg = distance_km(last, &stop);
        if travelled + leg <= limits.max_travel_km || stop.category.is_meal() {
            travelled += leg;
            kept.push(stop);
        } else {
            tracing::debug!(place = %stop.place_name, leg_km = leg, "Stop dropped, too far");
        }
    }

    kept
}
