//! Calendar collaborator boundary.
//!
//! The engine reads busy information and writes scheduled chunks through
//! [`CalendarProvider`]. Every read failure is treated as "no information"
//! by the callers in this crate; nothing here is fatal.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalendarError, EngineError, Result};
use crate::expander::expand_occurrences;
use crate::freebusy::merge;
use crate::model::{BusyInterval, Event};

/// A calendar entry as reported by the collaborator, with ISO-8601 times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub start: String,
    pub end: String,
    /// RFC 5545 recurrence rule; `start`/`end` are then the first occurrence.
    #[serde(default)]
    pub recurrence: Option<String>,
    /// IANA zone the recurrence is anchored in. Defaults to UTC.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl RawEvent {
    pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: None,
            summary: summary.into(),
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
            recurrence: None,
            timezone: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn recurring(mut self, rule: impl Into<String>, timezone: impl Into<String>) -> Self {
        self.recurrence = Some(rule.into());
        self.timezone = Some(timezone.into());
        self
    }

    /// Concrete occurrences of this entry overlapping `[window_start, window_end)`.
    ///
    /// # Errors
    /// Fails on unparsable timestamps, an inverted range, or a bad recurrence rule.
    pub fn occurrences(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        limit: u16,
    ) -> Result<Vec<BusyInterval>> {
        let start = parse_timestamp(&self.start)?;
        let end = parse_timestamp(&self.end)?;
        match &self.recurrence {
            Some(rule) => expand_occurrences(
                rule,
                start,
                end,
                self.timezone.as_deref().unwrap_or("UTC"),
                window_start,
                window_end,
                limit,
            ),
            None => {
                let interval = BusyInterval::try_new(start, end)?;
                Ok(if interval.overlaps(window_start, window_end) {
                    vec![interval]
                } else {
                    Vec::new()
                })
            }
        }
    }
}

/// One busy period from a free/busy query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBusy {
    pub start: String,
    pub end: String,
}

/// Acknowledgement returned when an event is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// The remote calendar, as seen by the engine.
///
/// Implementations may be slow or fail; the engine treats every call as
/// synchronous and recovers locally from errors.
pub trait CalendarProvider {
    /// Entries intersecting `[time_min, time_max)`.
    fn get_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> std::result::Result<Vec<RawEvent>, CalendarError>;

    /// Busy periods of `calendar_id` within `[time_min, time_max)`.
    fn query_freebusy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        calendar_id: &str,
    ) -> std::result::Result<Vec<RawBusy>, CalendarError>;

    /// Persist an event that has both start and end assigned.
    fn create_event(&mut self, event: &Event) -> std::result::Result<CreatedEvent, CalendarError>;
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2026-03-02T09:00:00+01:00`, `...Z`) and offset-less
/// `2026-03-02T09:00:00`, which is taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| EngineError::InvalidTimestamp(value.to_string()))
}

/// Canonical busy list from enumerated calendar entries.
///
/// Recurring entries are expanded; malformed entries are skipped with a warning.
pub fn busy_from_events(
    events: &[RawEvent],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    limit: u16,
) -> Vec<BusyInterval> {
    let mut intervals = Vec::with_capacity(events.len());
    for event in events {
        match event.occurrences(window_start, window_end, limit) {
            Ok(occurrences) => intervals.extend(occurrences),
            Err(err) => warn!(
                summary = %event.summary,
                error = %err,
                "skipping malformed calendar entry"
            ),
        }
    }
    merge(&intervals)
}

/// Canonical busy list from a free/busy response; malformed periods are skipped.
pub fn busy_from_freebusy(periods: &[RawBusy]) -> Vec<BusyInterval> {
    let intervals: Vec<BusyInterval> = periods
        .iter()
        .filter_map(|period| {
            let parsed = parse_timestamp(&period.start).and_then(|start| {
                parse_timestamp(&period.end).and_then(|end| BusyInterval::try_new(start, end))
            });
            match parsed {
                Ok(interval) => Some(interval),
                Err(err) => {
                    warn!(
                        start = %period.start,
                        end = %period.end,
                        error = %err,
                        "skipping malformed busy period"
                    );
                    None
                }
            }
        })
        .collect();
    merge(&intervals)
}

/// In-memory calendar, used by the CLI and in tests.
#[derive(Debug, Clone)]
pub struct MemoryCalendar {
    events: Vec<RawEvent>,
    next_id: u64,
    expansion_limit: u16,
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            expansion_limit: 500,
        }
    }

    pub fn with_events(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            ..Self::new()
        }
    }

    pub fn add(&mut self, event: RawEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }
}

impl CalendarProvider for MemoryCalendar {
    fn get_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> std::result::Result<Vec<RawEvent>, CalendarError> {
        let mut found: Vec<(DateTime<Utc>, RawEvent)> = Vec::new();
        for event in &self.events {
            match event.occurrences(time_min, time_max, self.expansion_limit) {
                Ok(occurrences) if event.recurrence.is_some() => {
                    // Report each occurrence as its own concrete entry.
                    found.extend(occurrences.into_iter().map(|occ| {
                        let mut instance = event.clone();
                        instance.start = occ.start.to_rfc3339();
                        instance.end = occ.end.to_rfc3339();
                        instance.recurrence = None;
                        (occ.start, instance)
                    }));
                }
                Ok(occurrences) => {
                    if let Some(first) = occurrences.first() {
                        found.push((first.start, event.clone()));
                    }
                }
                // Malformed entries are passed through untouched; readers skip them.
                Err(_) => found.push((time_min, event.clone())),
            }
        }
        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, event)| event).collect())
    }

    fn query_freebusy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        _calendar_id: &str,
    ) -> std::result::Result<Vec<RawBusy>, CalendarError> {
        Ok(
            busy_from_events(&self.events, time_min, time_max, self.expansion_limit)
                .into_iter()
                .map(|interval| RawBusy {
                    start: interval.start.to_rfc3339(),
                    end: interval.end.to_rfc3339(),
                })
                .collect(),
        )
    }

    fn create_event(&mut self, event: &Event) -> std::result::Result<CreatedEvent, CalendarError> {
        let (Some(start), Some(end)) = (event.start_time, event.end_time) else {
            return Err(CalendarError::Rejected(format!(
                "event '{}' has no assigned time",
                event.title
            )));
        };
        if start >= end {
            return Err(CalendarError::Rejected(format!(
                "event '{}' ends before it starts",
                event.title
            )));
        }
        let id = format!("mem-{}", self.next_id);
        self.next_id += 1;
        self.events
            .push(RawEvent::new(event.title.clone(), start, end).with_id(id.clone()));
        Ok(CreatedEvent {
            id,
            html_link: None,
        })
    }
}
