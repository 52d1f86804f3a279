//! Recurring calendar entries -- expands an RRULE into concrete busy intervals.
//!
//! Wraps the `rrule` crate (v0.13) and `chrono-tz` so weekly meetings keep
//! their wall-clock time across DST transitions.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{EngineError, Result};
use crate::model::BusyInterval;

/// Expand a recurring entry into the occurrences intersecting a window.
///
/// # Arguments
/// - `rule` -- RFC 5545 rule, with or without the `RRULE:` prefix
/// - `first_start`/`first_end` -- the first occurrence; its length is reused
/// - `timezone` -- IANA timezone the rule recurs in
/// - `window_start`/`window_end` -- only occurrences overlapping this range are returned
/// - `limit` -- maximum number of occurrences generated inside the window
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule is empty or unparseable.
/// Returns `EngineError::InvalidTimezone` if the timezone is not a valid IANA identifier.
pub fn expand_occurrences(
    rule: &str,
    first_start: DateTime<Utc>,
    first_end: DateTime<Utc>,
    timezone: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    limit: u16,
) -> Result<Vec<BusyInterval>> {
    let rule = rule.trim();
    let rule = rule.strip_prefix("RRULE:").unwrap_or(rule);
    if rule.is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }
    if first_start >= first_end {
        return Err(EngineError::InvalidInterval {
            start: first_start.to_rfc3339(),
            end: first_end.to_rfc3339(),
        });
    }
    if first_start >= window_end || limit == 0 {
        return Ok(Vec::new());
    }

    let tz: Tz = timezone
        .parse()
        .map_err(|_| EngineError::InvalidTimezone(timezone.to_string()))?;

    let dtstart_ical = first_start
        .with_timezone(&tz)
        .format("%Y%m%dT%H%M%S")
        .to_string();

    let rrule_set = format!("DTSTART;TZID={}:{}\nRRULE:{}", timezone, dtstart_ical, rule)
        .parse::<RRuleSet>()
        .map_err(|e| EngineError::InvalidRule(e.to_string()))?;

    // Bound the iteration by the window, not by DTSTART, so `limit` counts only
    // occurrences that can overlap it however long ago the series started.
    let length = first_end - first_start;
    let lower = window_start
        .checked_sub_signed(length)
        .unwrap_or(window_start);
    let occurrences = rrule_set
        .after(lower.with_timezone(&rrule::Tz::UTC))
        .before(window_end.with_timezone(&rrule::Tz::UTC))
        .all(limit)
        .dates
        .into_iter()
        .map(|dt| {
            let start: DateTime<Utc> = dt.with_timezone(&Utc);
            BusyInterval {
                start,
                end: start + length,
            }
        })
        .filter(|occurrence| occurrence.overlaps(window_start, window_end))
        .collect();

    Ok(occurrences)
}
