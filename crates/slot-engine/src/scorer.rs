//! Candidate scoring and the optimal-slot scan.
//!
//! Candidates are generated at a fixed step inside each day's working
//! window, rejected when their occupied range (prep + event + followup)
//! touches a busy interval, and scored as
//! `base + energy_term + preference_term`. The highest score wins; equal
//! scores keep chronological order, so the earliest start wins ties.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringWeights;
use crate::freebusy::is_busy;
use crate::model::{BusyInterval, EventType};
use crate::profile::{TimePreference, UserProfile};

/// Longest search horizon, in days. Larger requests are clamped to it.
pub const MAX_SEARCH_DAYS: u32 = 3660;

/// A scored candidate. `start`/`end` bound the event itself, excluding buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub score: f64,
}

/// Energy contribution for an event type at a given energy level.
///
/// Demanding work wants peak energy; routine work prefers a moderate level;
/// everything else ignores the curve.
pub fn energy_term(event_type: EventType, energy: f64, weights: &ScoringWeights) -> f64 {
    match event_type {
        EventType::Focus | EventType::LongTerm => energy * weights.energy_weight,
        EventType::Daily | EventType::ShortTerm => {
            (1.0 - (energy - 0.5).abs()) * weights.energy_weight
        }
        EventType::Meeting | EventType::Personal | EventType::Break => 0.0,
    }
}

/// Closeness of `hour` to the learned optimal hour, zero when nothing was learned.
pub fn preference_term(hour: u32, optimal_hour: Option<u32>, weights: &ScoringWeights) -> f64 {
    let Some(optimal) = optimal_hour else {
        return 0.0;
    };
    let distance = (f64::from(hour) - f64::from(optimal)).abs();
    (1.0 - distance / weights.preference_span_hours).max(0.0) * weights.preference_weight
}

/// Score an event of `event_type` starting at local `hour`.
pub fn score_candidate(
    event_type: EventType,
    hour: u32,
    profile: &UserProfile,
    optimal_hour: Option<u32>,
    weights: &ScoringWeights,
) -> f64 {
    let energy = profile.energy_level(hour, weights.default_energy);
    weights.base
        + energy_term(event_type, energy, weights)
        + preference_term(hour, optimal_hour, weights)
}

/// Inputs of one optimal-slot scan.
#[derive(Debug, Clone)]
pub struct SlotQuery<'a> {
    pub event_type: EventType,
    pub event_duration: Duration,
    pub prep: Duration,
    pub followup: Duration,
    pub search_start: DateTime<Utc>,
    pub search_days: u32,
    pub step: Duration,
    pub preference: Option<&'a TimePreference>,
}

impl SlotQuery<'_> {
    pub fn occupied_duration(&self) -> Duration {
        self.prep + self.event_duration + self.followup
    }
}

/// Score every admissible candidate, best first.
///
/// `busy` must cover the whole search range. Days without working hours are
/// skipped, as are candidates starting before `search_start`.
pub fn rank_candidates(
    query: &SlotQuery<'_>,
    profile: &UserProfile,
    tz: Tz,
    busy: &[BusyInterval],
    optimal_hour: Option<u32>,
    weights: &ScoringWeights,
) -> Vec<SlotCandidate> {
    let mut candidates = Vec::new();
    if query.step <= Duration::zero() || query.event_duration <= Duration::zero() {
        return candidates;
    }
    let occupied = query.occupied_duration();
    let first_day = query.search_start.with_timezone(&tz).date_naive();

    for offset in 0..query.search_days.min(MAX_SEARCH_DAYS) {
        let Some(date) = first_day.checked_add_days(chrono::Days::new(u64::from(offset))) else {
            break;
        };
        let Some(hours) = profile.working_window(date.weekday()) else {
            debug!(%date, "no working hours, skipping day");
            continue;
        };
        let Some((mut local_start, mut local_end)) = hours.on(date) else {
            continue;
        };
        if let Some(preference) = query.preference {
            let Some((pref_start, pref_end)) = preference.on(date) else {
                continue;
            };
            local_start = local_start.max(pref_start);
            local_end = local_end.min(pref_end);
            if local_start >= local_end {
                debug!(%date, "time preference outside working hours, skipping day");
                continue;
            }
        }
        let (Some(window_start), Some(window_end)) =
            (to_utc(tz, local_start), to_utc(tz, local_end))
        else {
            debug!(%date, "working window falls in a DST gap, skipping day");
            continue;
        };

        let mut cursor = window_start;
        while cursor + occupied <= window_end {
            if cursor >= query.search_start && !is_busy(busy, cursor, cursor + occupied) {
                let start = cursor + query.prep;
                let hour = start.with_timezone(&tz).hour();
                candidates.push(SlotCandidate {
                    start,
                    end: start + query.event_duration,
                    score: score_candidate(query.event_type, hour, profile, optimal_hour, weights),
                });
            }
            cursor += query.step;
        }
    }

    // Stable: equal scores stay in chronological order.
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// The single best candidate, or `None` when nothing fits the horizon.
pub fn best_candidate(
    query: &SlotQuery<'_>,
    profile: &UserProfile,
    tz: Tz,
    busy: &[BusyInterval],
    optimal_hour: Option<u32>,
    weights: &ScoringWeights,
) -> Option<SlotCandidate> {
    rank_candidates(query, profile, tz, busy, optimal_hour, weights)
        .into_iter()
        .next()
}

pub(crate) fn to_utc(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
