//! Multi-session task planning.
//!
//! Spreads a total duration ("10 hours of focused work") over free time in
//! a bounded horizon of weeks, day by day, in chunks of a preferred size.
//! Greedy and deterministic: earlier free time is always consumed first.

use chrono::{DateTime, Days, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{busy_from_freebusy, CalendarProvider};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::freebusy::find_free_slots;
use crate::model::{ChunkSource, Event, EventType, ScheduledChunk};
use crate::profile::WorkingHours;
use crate::scorer::{to_utc, MAX_SEARCH_DAYS};

/// A request to place `total_hours` of work in chunks of `chunk_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub summary: String,
    pub event_type: EventType,
    pub total_hours: f64,
    pub chunk_hours: f64,
    /// Local clock window searched on every day.
    pub daily_window: WorkingHours,
    pub max_weeks: u32,
    /// Nothing is placed before this instant; day 0 is its local date.
    pub now: DateTime<Utc>,
    /// Compute chunks without writing them to the calendar.
    pub dry_run: bool,
}

impl PlanRequest {
    pub fn new(
        summary: impl Into<String>,
        total_hours: f64,
        chunk_hours: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            summary: summary.into(),
            event_type: EventType::Focus,
            total_hours,
            chunk_hours,
            daily_window: WorkingHours::hours(9, 18),
            max_weeks: 2,
            now,
            dry_run: false,
        }
    }

    pub fn with_window(mut self, daily_window: WorkingHours) -> Self {
        self.daily_window = daily_window;
        self
    }

    pub fn with_max_weeks(mut self, max_weeks: u32) -> Self {
        self.max_weeks = max_weeks;
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Result of a plan. A non-zero `remaining_hours` is a soft failure: the
/// horizon did not offer enough usable free time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub chunks: Vec<ScheduledChunk>,
    pub requested_hours: f64,
    pub scheduled_hours: f64,
    pub remaining_hours: f64,
    /// Chunks the calendar refused to persist.
    pub failed_writes: usize,
}

impl PlanOutcome {
    pub fn is_complete(&self) -> bool {
        self.remaining_hours <= 0.0
    }
}

/// Greedily allocate the request across free slots, writing each chunk
/// through `calendar` unless `dry_run` is set.
///
/// A failed free/busy query skips that day. A failed write skips that chunk
/// without counting it as scheduled; the loop always continues.
///
/// # Errors
/// Returns `EngineError::InvalidRequest` for a negative total, a
/// non-positive chunk size, or an empty daily window.
pub fn plan_week_schedule<C: CalendarProvider + ?Sized>(
    calendar: &mut C,
    request: &PlanRequest,
    tz: Tz,
    config: &EngineConfig,
) -> Result<PlanOutcome> {
    validate(request)?;

    let total_minutes = total_to_minutes(request.total_hours);
    let chunk_minutes = chunk_to_minutes(request.chunk_hours);
    let min_chunk_minutes = i64::from(config.min_chunk_minutes);
    let first_day = request.now.with_timezone(&tz).date_naive();

    let mut remaining = total_minutes;
    let mut chunks = Vec::new();
    let mut failed_writes = 0;

    let max_weeks = request.max_weeks.min(MAX_SEARCH_DAYS / 7);

    'horizon: for week in 0..max_weeks {
        for day in 0..7u32 {
            if remaining <= 0 {
                break 'horizon;
            }
            let offset = u64::from(week) * 7 + u64::from(day);
            let Some(date) = first_day.checked_add_days(Days::new(offset)) else {
                break 'horizon;
            };
            let Some((local_start, local_end)) = request.daily_window.on(date) else {
                continue;
            };
            let (Some(window_start), Some(window_end)) =
                (to_utc(tz, local_start), to_utc(tz, local_end))
            else {
                debug!(%date, "daily window falls in a DST gap, skipping day");
                continue;
            };
            let window_start = window_start.max(request.now);
            if window_start >= window_end {
                debug!(%date, "daily window already elapsed");
                continue;
            }

            let busy = match calendar.query_freebusy(window_start, window_end, &config.calendar_id)
            {
                Ok(periods) => busy_from_freebusy(&periods),
                Err(err) => {
                    warn!(%date, error = %err, "free/busy query failed; skipping day");
                    continue;
                }
            };

            let min_duration = Duration::minutes(chunk_minutes.min(remaining));
            for slot in find_free_slots(window_start, window_end, &busy, min_duration) {
                let mut cursor = slot.start;
                while remaining > 0 {
                    let available = (slot.end - cursor).num_minutes();
                    let length = chunk_minutes.min(remaining).min(available);
                    if length < min_chunk_minutes {
                        break;
                    }
                    let end = cursor + Duration::minutes(length);
                    if let Some(source) = persist_chunk(calendar, request, cursor, end) {
                        chunks.push(ScheduledChunk {
                            start: cursor,
                            end,
                            duration_hours: length as f64 / 60.0,
                            source,
                        });
                        remaining -= length;
                    } else {
                        failed_writes += 1;
                    }
                    cursor = end;
                }
                if remaining <= 0 {
                    break;
                }
            }
        }
    }

    let scheduled_minutes = total_minutes - remaining.max(0);
    let outcome = PlanOutcome {
        chunks,
        requested_hours: request.total_hours,
        scheduled_hours: scheduled_minutes as f64 / 60.0,
        remaining_hours: remaining.max(0) as f64 / 60.0,
        failed_writes,
    };

    info!(
        summary = %request.summary,
        requested_hours = outcome.requested_hours,
        scheduled_hours = outcome.scheduled_hours,
        remaining_hours = outcome.remaining_hours,
        chunks = outcome.chunks.len(),
        failed_writes,
        dry_run = request.dry_run,
        "plan finished"
    );

    Ok(outcome)
}

fn validate(request: &PlanRequest) -> Result<()> {
    if !request.total_hours.is_finite() || request.total_hours < 0.0 {
        return Err(EngineError::InvalidRequest(format!(
            "total_hours must be a non-negative number, got {}",
            request.total_hours
        )));
    }
    if !request.chunk_hours.is_finite() || request.chunk_hours <= 0.0 {
        return Err(EngineError::InvalidRequest(format!(
            "chunk_hours must be positive, got {}",
            request.chunk_hours
        )));
    }
    if request.daily_window.start >= request.daily_window.end {
        return Err(EngineError::InvalidRequest(
            "daily window must start before it ends".to_string(),
        ));
    }
    Ok(())
}

/// Largest whole number of minutes whose hour value does not exceed `hours`.
fn total_to_minutes(hours: f64) -> i64 {
    let minutes = (hours * 60.0).round() as i64;
    if minutes as f64 / 60.0 > hours {
        minutes - 1
    } else {
        minutes
    }
}

/// Chunks are capped by the remaining total, so rounding here cannot overshoot.
fn chunk_to_minutes(hours: f64) -> i64 {
    ((hours * 60.0).round() as i64).max(1)
}

fn persist_chunk<C: CalendarProvider + ?Sized>(
    calendar: &mut C,
    request: &PlanRequest,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<ChunkSource> {
    if request.dry_run {
        return Some(ChunkSource::DryRun);
    }
    let mut event = Event::new(request.summary.clone(), request.event_type).with_times(start, end);
    event.is_flexible = false;
    match calendar.create_event(&event) {
        Ok(created) => Some(ChunkSource::Event { id: created.id }),
        Err(err) => {
            warn!(
                summary = %request.summary,
                %start,
                %end,
                error = %err,
                "failed to persist chunk; skipping"
            );
            None
        }
    }
}
