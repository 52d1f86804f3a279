//! Disambiguation of end times that land before their start.
//!
//! Upstream parsers sometimes produce "8pm to 9" as 20:00-09:00 on the same
//! day. How to repair that is a policy choice, not a fixed rule.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeridiemPolicy {
    /// Reject the range.
    Strict,
    /// Move an AM end (hour < 12) forward 12 hours, falling back to the next day.
    #[default]
    PromotePm,
    /// Treat the end as the same clock time on the following day.
    NextDay,
}

/// Repair an end that does not come after `start`, according to `policy`.
///
/// Returns `Some(end)` untouched when it already follows `start`, and `None`
/// when the policy cannot produce a valid range. Pass local times so the
/// AM/PM test sees the user's clock.
pub fn resolve_end<Tz: TimeZone>(
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    policy: MeridiemPolicy,
) -> Option<DateTime<Tz>> {
    if end > start {
        return Some(end);
    }
    let candidate = match policy {
        MeridiemPolicy::Strict => return None,
        MeridiemPolicy::PromotePm => {
            let promoted = end.clone() + Duration::hours(12);
            if end.hour() < 12 && promoted > start {
                promoted
            } else {
                end + Duration::days(1)
            }
        }
        MeridiemPolicy::NextDay => end + Duration::days(1),
    };
    (candidate > start).then_some(candidate)
}
