//! Core data model shared by every engine component.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Kind of event being scheduled. Scoring branches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Daily,
    ShortTerm,
    LongTerm,
    Focus,
    Meeting,
    Personal,
    Break,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::Daily,
        EventType::ShortTerm,
        EventType::LongTerm,
        EventType::Focus,
        EventType::Meeting,
        EventType::Personal,
        EventType::Break,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Daily => "daily",
            EventType::ShortTerm => "short_term",
            EventType::LongTerm => "long_term",
            EventType::Focus => "focus",
            EventType::Meeting => "meeting",
            EventType::Personal => "personal",
            EventType::Break => "break",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| EngineError::InvalidRequest(format!("unknown event type '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// An event handed to the engine by a form or the NLP layer.
///
/// `start_time`/`end_time` stay `None` until the engine (or the caller)
/// assigns a slot. `prep_time` and `followup_time` are minutes of buffer
/// that must also be free around the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub event_type: EventType,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Requested length when no end time is known yet.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub followup_time: u32,
    #[serde(default)]
    pub is_flexible: bool,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Event {
    pub fn new(title: impl Into<String>, event_type: EventType) -> Self {
        Self {
            title: title.into(),
            event_type,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            priority: Priority::default(),
            prep_time: 0,
            followup_time: 0,
            is_flexible: true,
            participants: Vec::new(),
            location: None,
        }
    }

    pub fn with_times(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_buffers(mut self, prep_minutes: u32, followup_minutes: u32) -> Self {
        self.prep_time = prep_minutes;
        self.followup_time = followup_minutes;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Assign a concrete slot to this event.
    pub fn assign(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.start_time = Some(start);
        self.end_time = Some(end);
    }
}

/// A time range during which the user is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap test against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A free time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl FreeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Where a scheduled chunk ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkSource {
    /// Persisted by the calendar collaborator under this id.
    Event { id: String },
    /// Computed only; nothing was written.
    DryRun,
}

/// One contiguous session carved out of a multi-session task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledChunk {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_hours: f64,
    pub source: ChunkSource,
}
