//! Detect calendar entries overlapping a fixed-time event.
//!
//! Adjacent entries (where one ends exactly when the other starts) are NOT
//! conflicts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::{CalendarProvider, RawEvent};

/// Conflict severity. Single-tier for now: every overlap is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
}

/// An existing entry that overlaps the proposed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub event: RawEvent,
    /// The overlapping occurrence (differs from `event.start` for recurring entries).
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub overlap_minutes: i64,
    pub severity: Severity,
}

/// Find every entry whose range overlaps `[start, end)`.
///
/// Two ranges overlap iff `start < other.end && other.start < end`.
/// The overlap duration is `min(end, other.end) - max(start, other.start)`.
/// Malformed entries are skipped with a warning.
pub fn find_conflicts(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    entries: &[RawEvent],
    expansion_limit: u16,
) -> Vec<ConflictRecord> {
    let mut conflicts = Vec::new();
    if start >= end {
        return conflicts;
    }

    for entry in entries {
        let occurrences = match entry.occurrences(start, end, expansion_limit) {
            Ok(occurrences) => occurrences,
            Err(err) => {
                warn!(summary = %entry.summary, error = %err, "skipping malformed calendar entry");
                continue;
            }
        };
        for occurrence in occurrences {
            if !(end <= occurrence.start || start >= occurrence.end) {
                let overlap_start = start.max(occurrence.start);
                let overlap_end = end.min(occurrence.end);
                conflicts.push(ConflictRecord {
                    event: entry.clone(),
                    start: occurrence.start,
                    end: occurrence.end,
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                    severity: Severity::High,
                });
            }
        }
    }

    conflicts
}

/// Query `calendar` around `[start, end)` and report overlapping entries.
///
/// The query is padded by `padding` on both sides to catch boundary cases.
/// A failed query is logged and yields no conflicts.
pub fn check_conflicts<C: CalendarProvider + ?Sized>(
    calendar: &C,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    padding: Duration,
    expansion_limit: u16,
) -> Vec<ConflictRecord> {
    match calendar.get_events(start - padding, end + padding) {
        Ok(entries) => find_conflicts(start, end, &entries, expansion_limit),
        Err(err) => {
            warn!(error = %err, "calendar query failed; reporting no conflicts");
            Vec::new()
        }
    }
}
