//! User profile: working hours, energy curve, meeting defaults.
//!
//! The profile is owned by the surrounding application; the engine only
//! reads it. All clock times and energy hours are local to `timezone`.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A daily clock window, e.g. 09:00-18:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whole-hour convenience constructor. Hours above 23 clamp to 23:59.
    pub fn hours(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start: clock(start_hour),
            end: clock(end_hour),
        }
    }

    /// Local start/end of this window on `date`. `None` when the window is empty.
    pub fn on(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if self.start >= self.end {
            return None;
        }
        Some((date.and_time(self.start), date.and_time(self.end)))
    }
}

fn clock(hour: u32) -> NaiveTime {
    let minute = if hour > 23 { 59 } else { 0 };
    NaiveTime::from_hms_opt(hour.min(23), minute, 0).unwrap_or_default()
}

/// Read-only user preferences consumed by slot scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// IANA time zone name (e.g. "Europe/Berlin").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Days missing from this map are never searched.
    #[serde(default = "default_working_hours")]
    pub working_hours: HashMap<Weekday, WorkingHours>,
    /// Self-reported alertness per local hour (0-23), each in `[0, 1]`.
    #[serde(default)]
    pub energy_patterns: BTreeMap<u32, f64>,
    /// Minutes; used for meetings without an explicit duration.
    #[serde(default = "default_meeting_length")]
    pub preferred_meeting_length: u32,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_meeting_length() -> u32 {
    60
}

fn default_working_hours() -> HashMap<Weekday, WorkingHours> {
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .map(|day| (day, WorkingHours::hours(9, 17)))
    .collect()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            working_hours: default_working_hours(),
            energy_patterns: BTreeMap::new(),
            preferred_meeting_length: default_meeting_length(),
        }
    }
}

impl UserProfile {
    /// Parse the profile's time zone.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTimezone` if `timezone` is not a valid IANA identifier.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn working_window(&self, weekday: Weekday) -> Option<WorkingHours> {
        self.working_hours.get(&weekday).copied()
    }

    /// Energy level at a local hour, clamped to `[0, 1]`; `fallback` when unset.
    pub fn energy_level(&self, hour: u32, fallback: f64) -> f64 {
        self.energy_patterns
            .get(&hour)
            .copied()
            .unwrap_or(fallback)
            .clamp(0.0, 1.0)
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_energy(mut self, hour: u32, level: f64) -> Self {
        self.energy_patterns.insert(hour, level);
        self
    }

    pub fn with_working_hours(mut self, weekday: Weekday, hours: WorkingHours) -> Self {
        self.working_hours.insert(weekday, hours);
        self
    }
}

/// Named part of the day, as produced by the natural-language layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// Default local hour window `[start, end)`; an end of 24 means midnight.
    pub fn default_hours(&self) -> (u32, u32) {
        match self {
            DayPeriod::Morning => (8, 12),
            DayPeriod::Afternoon => (12, 17),
            DayPeriod::Evening => (17, 21),
            DayPeriod::Night => (21, 24),
        }
    }
}

/// A vague time preference ("tomorrow afternoon") narrowing the daily search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePreference {
    pub period: DayPeriod,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimePreference {
    pub fn from_period(period: DayPeriod) -> Self {
        let (start_hour, end_hour) = period.default_hours();
        Self {
            period,
            start_hour,
            end_hour,
        }
    }

    /// Local `[start, end)` of this preference on `date`.
    pub fn on(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = date.and_hms_opt(self.start_hour.min(23), 0, 0)?;
        let end = if self.end_hour >= 24 {
            date.succ_opt()?.and_hms_opt(0, 0, 0)?
        } else {
            date.and_hms_opt(self.end_hour, 0, 0)?
        };
        (start < end).then_some((start, end))
    }
}
