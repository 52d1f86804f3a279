//! Busy-interval normalization and free-slot computation.
//!
//! Sorts busy intervals by start time, merges overlapping or adjacent ones,
//! then computes the gaps between merged periods within a search window.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::model::{BusyInterval, FreeSlot};

/// Merge overlapping or adjacent busy intervals.
///
/// Returns a sorted, pairwise-disjoint list covering exactly the instants of
/// the input. Empty or inverted intervals are skipped with a warning.
pub fn merge(intervals: &[BusyInterval]) -> Vec<BusyInterval> {
    let mut sorted: Vec<BusyInterval> = intervals
        .iter()
        .filter(|interval| {
            if interval.start < interval.end {
                true
            } else {
                warn!(
                    start = %interval.start,
                    end = %interval.end,
                    "skipping malformed busy interval"
                );
                false
            }
        })
        .copied()
        .collect();

    // Sort by start time (then by end time for stability).
    sorted.sort_by_key(|interval| (interval.start, interval.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                // Overlapping or adjacent: extend the current interval.
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Find free slots of at least `min_duration` within `[search_start, search_end]`.
///
/// Busy intervals may be unsorted and overlapping; they are merged first.
/// Returns free slots sorted by start time.
pub fn find_free_slots(
    search_start: DateTime<Utc>,
    search_end: DateTime<Utc>,
    busy: &[BusyInterval],
    min_duration: Duration,
) -> Vec<FreeSlot> {
    if search_start >= search_end {
        return Vec::new();
    }

    let mut free_slots = Vec::new();
    let mut cursor = search_start;
    let mut push_gap = |start: DateTime<Utc>, end: DateTime<Utc>| {
        if start < end && end - start >= min_duration {
            free_slots.push(FreeSlot::new(start, end));
        }
    };

    for interval in merge(busy) {
        if interval.end <= search_start {
            continue;
        }
        if interval.start >= search_end {
            break;
        }
        if cursor < interval.start {
            push_gap(cursor, interval.start);
        }
        cursor = cursor.max(interval.end);
    }

    // Trailing free slot after the last busy period.
    if cursor < search_end {
        push_gap(cursor, search_end);
    }

    free_slots
}

/// Find the first free slot of at least `min_duration` within the window.
pub fn find_first_free_slot(
    search_start: DateTime<Utc>,
    search_end: DateTime<Utc>,
    busy: &[BusyInterval],
    min_duration: Duration,
) -> Option<FreeSlot> {
    find_free_slots(search_start, search_end, busy, min_duration)
        .into_iter()
        .next()
}

/// Whether `[start, end)` intersects any of the given busy intervals.
pub fn is_busy(busy: &[BusyInterval], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    busy.iter().any(|interval| interval.overlaps(start, end))
}
