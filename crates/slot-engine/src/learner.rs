//! Preference learning from scheduling history.
//!
//! Keeps per-event-type hourly counters and per-weekday pattern logs, and
//! groups recorded hours into batching suggestions with a small 1-D k-means.
//!
//! The learner is plain owned state. It is not synchronized: a caller sharing
//! one across threads must serialize access itself.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{Event, EventType};

const MAX_CLUSTERS: usize = 3;
const MAX_ITERATIONS: usize = 50;
/// Types need more samples than this before clustering.
const MIN_SAMPLES: u32 = 3;
/// Clusters need more members than this to become a suggestion.
const MIN_CLUSTER_MEMBERS: usize = 2;

/// One scheduled event as seen by the weekday log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub event_type: EventType,
    pub hour: u32,
    pub duration_minutes: i64,
}

/// Everything the learner knows; serializable so callers can persist it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceState {
    /// event type -> local hour -> count
    pub time_preferences: BTreeMap<EventType, BTreeMap<u32, u32>>,
    pub scheduling_patterns: HashMap<Weekday, Vec<PatternRecord>>,
}

/// Hours of one event type that tend to cluster together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSuggestion {
    pub event_type: EventType,
    pub hours: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct PreferenceLearner {
    state: PreferenceState,
    tz: Tz,
}

impl Default for PreferenceLearner {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl PreferenceLearner {
    /// Create an empty learner recording hours in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            state: PreferenceState::default(),
            tz,
        }
    }

    pub fn from_state(state: PreferenceState, tz: Tz) -> Self {
        Self { state, tz }
    }

    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state).map_err(|e| EngineError::State(e.to_string()))
    }

    pub fn from_json(json: &str, tz: Tz) -> Result<Self> {
        let state = serde_json::from_str(json).map_err(|e| EngineError::State(e.to_string()))?;
        Ok(Self::from_state(state, tz))
    }

    /// Record a scheduled event. Events without a start time are ignored.
    pub fn add_event(&mut self, event: &Event) {
        let Some(start) = event.start_time else {
            debug!(title = %event.title, "ignoring unscheduled event");
            return;
        };
        let local = start.with_timezone(&self.tz);
        let hour = local.hour();
        let duration_minutes = match event.end_time {
            Some(end) => (end - start).num_minutes(),
            None => i64::from(event.duration_minutes.unwrap_or(0)),
        };

        *self
            .state
            .time_preferences
            .entry(event.event_type)
            .or_default()
            .entry(hour)
            .or_insert(0) += 1;

        self.state
            .scheduling_patterns
            .entry(local.weekday())
            .or_default()
            .push(PatternRecord {
                event_type: event.event_type,
                hour,
                duration_minutes,
            });
    }

    /// Most frequently recorded local hour for `event_type`; ties go to the earlier hour.
    pub fn get_optimal_time(&self, event_type: EventType) -> Option<u32> {
        let counts = self.state.time_preferences.get(&event_type)?;
        mode(counts.iter().map(|(hour, count)| (*hour, *count)))
    }

    /// Like [`get_optimal_time`](Self::get_optimal_time), restricted to one weekday's log.
    pub fn optimal_time_on(&self, event_type: EventType, weekday: Weekday) -> Option<u32> {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for record in self.state.scheduling_patterns.get(&weekday)? {
            if record.event_type == event_type {
                *counts.entry(record.hour).or_insert(0) += 1;
            }
        }
        mode(counts.into_iter())
    }

    /// Optimal hour for `event_type` on a given date: the weekday's own log
    /// when it has entries for the type, otherwise the overall histogram.
    pub fn get_optimal_time_on(&self, event_type: EventType, date: NaiveDate) -> Option<u32> {
        self.optimal_time_on(event_type, date.weekday())
            .or_else(|| self.get_optimal_time(event_type))
    }

    /// Total number of recorded events of `event_type`.
    pub fn sample_count(&self, event_type: EventType) -> u32 {
        self.state
            .time_preferences
            .get(&event_type)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Cluster recorded hours per event type and report dense groups.
    ///
    /// Types with more than three samples are split into at most three
    /// groups; groups with more than two members are returned. The grouping
    /// is advisory and not guaranteed optimal.
    pub fn suggest_batch_events(&self) -> Vec<BatchSuggestion> {
        let mut suggestions = Vec::new();
        for (event_type, counts) in &self.state.time_preferences {
            let total: u32 = counts.values().sum();
            if total <= MIN_SAMPLES {
                continue;
            }
            let hours: Vec<u32> = counts
                .iter()
                .flat_map(|(hour, count)| std::iter::repeat_n(*hour, *count as usize))
                .collect();
            let distinct: Vec<u32> = counts.keys().copied().collect();
            let k = distinct.len().min(MAX_CLUSTERS);

            for cluster in kmeans_1d(&hours, &distinct, k) {
                if cluster.len() > MIN_CLUSTER_MEMBERS {
                    suggestions.push(BatchSuggestion {
                        event_type: *event_type,
                        hours: cluster,
                    });
                }
            }
        }
        suggestions
    }
}

fn mode(counts: impl Iterator<Item = (u32, u32)>) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (hour, count) in counts {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((hour, count)),
        }
    }
    best.map(|(hour, _)| hour)
}

/// Lloyd's algorithm on sorted 1-D samples, seeded with evenly spread distinct values.
fn kmeans_1d(samples: &[u32], distinct: &[u32], k: usize) -> Vec<Vec<u32>> {
    if k == 0 || samples.is_empty() {
        return Vec::new();
    }

    let mut centroids: Vec<f64> = if k == 1 {
        vec![samples.iter().map(|&h| f64::from(h)).sum::<f64>() / samples.len() as f64]
    } else {
        (0..k)
            .map(|i| f64::from(distinct[i * (distinct.len() - 1) / (k - 1)]))
            .collect()
    };

    let mut assignment = vec![0usize; samples.len()];
    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (slot, &sample) in assignment.iter_mut().zip(samples) {
            let nearest = nearest_centroid(&centroids, f64::from(sample));
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }

        for (index, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f64> = samples
                .iter()
                .zip(&assignment)
                .filter(|&(_, &a)| a == index)
                .map(|(&h, _)| f64::from(h))
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f64>() / members.len() as f64;
            }
        }

        if !changed {
            break;
        }
    }

    let mut clusters = vec![Vec::new(); k];
    for (&sample, &index) in samples.iter().zip(&assignment) {
        clusters[index].push(sample);
    }
    clusters.retain(|cluster| !cluster.is_empty());
    clusters
}

fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = (value - centroid).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}
