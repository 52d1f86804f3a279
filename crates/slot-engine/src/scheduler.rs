//! Per-session entry point tying the engine components together.
//!
//! A [`Scheduler`] owns one user's calendar handle, profile, configuration
//! and preference history. Create one per session; nothing is global.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::calendar::{busy_from_events, CalendarProvider};
use crate::config::EngineConfig;
use crate::conflict::{self, ConflictRecord};
use crate::error::Result;
use crate::freebusy;
use crate::learner::{BatchSuggestion, PreferenceLearner};
use crate::meridiem::resolve_end;
use crate::model::{BusyInterval, Event, EventType, FreeSlot};
use crate::planner::{self, PlanOutcome, PlanRequest};
use crate::profile::{TimePreference, UserProfile};
use crate::scorer::{self, SlotCandidate, SlotQuery};

pub struct Scheduler<C> {
    calendar: C,
    profile: UserProfile,
    tz: Tz,
    config: EngineConfig,
    learner: PreferenceLearner,
}

impl<C: CalendarProvider> Scheduler<C> {
    /// # Errors
    /// Fails when the profile's time zone is unknown or the config is invalid.
    pub fn new(calendar: C, profile: UserProfile, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let tz = profile.tz()?;
        Ok(Self {
            calendar,
            profile,
            tz,
            config,
            learner: PreferenceLearner::new(tz),
        })
    }

    /// Replace the (empty) preference history with a previously saved one.
    pub fn with_learner(mut self, learner: PreferenceLearner) -> Self {
        self.learner = learner;
        self
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut C {
        &mut self.calendar
    }

    pub fn into_calendar(self) -> C {
        self.calendar
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn learner(&self) -> &PreferenceLearner {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut PreferenceLearner {
        &mut self.learner
    }

    /// Merged busy intervals in `[start, end)`. Empty when the calendar fails.
    pub fn busy_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<BusyInterval> {
        match self.calendar.get_events(start, end) {
            Ok(events) => busy_from_events(&events, start, end, self.config.expansion_limit),
            Err(err) => {
                warn!(error = %err, "calendar query failed; assuming no busy time");
                Vec::new()
            }
        }
    }

    /// Free slots of at least `min_duration` in `[start, end]`, against the live calendar.
    pub fn find_free_slots(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_duration: Duration,
    ) -> Vec<FreeSlot> {
        let busy = self.busy_between(start, end);
        freebusy::find_free_slots(start, end, &busy, min_duration)
    }

    /// The event's fixed range, with an end-before-start repaired by the
    /// configured meridiem policy. `None` when either time is missing or
    /// the policy rejects the range.
    pub fn resolve_range(&self, event: &Event) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = (event.start_time?, event.end_time?);
        let end = resolve_end(
            start.with_timezone(&self.tz),
            end.with_timezone(&self.tz),
            self.config.meridiem_policy,
        )?;
        Some((start, end.with_timezone(&Utc)))
    }

    /// Length of the event itself, excluding prep and followup buffers.
    pub fn event_duration(&self, event: &Event) -> Duration {
        if let Some((start, end)) = self.resolve_range(event) {
            return end - start;
        }
        let minutes = match (event.duration_minutes, event.event_type) {
            (Some(minutes), _) if minutes > 0 => minutes,
            (_, EventType::Meeting) => self.profile.preferred_meeting_length,
            _ => self.config.default_event_minutes,
        };
        Duration::minutes(i64::from(minutes))
    }

    /// Best-scoring slot for `event` within `search_days` days from `search_start`.
    ///
    /// Returns the event's own start/end (buffers are kept free around it).
    /// `None` means no slot exists in the horizon.
    pub fn find_optimal_slot(
        &self,
        event: &Event,
        search_start: DateTime<Utc>,
        search_days: u32,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.find_optimal_slot_within(event, search_start, search_days, None)
    }

    /// [`find_optimal_slot`](Self::find_optimal_slot) narrowed to a vague time preference.
    pub fn find_optimal_slot_within(
        &self,
        event: &Event,
        search_start: DateTime<Utc>,
        search_days: u32,
        preference: Option<&TimePreference>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let best = self
            .rank_slots(event, search_start, search_days, preference)
            .into_iter()
            .next();
        match &best {
            Some(candidate) => debug!(
                title = %event.title,
                start = %candidate.start,
                score = candidate.score,
                "selected slot"
            ),
            None => debug!(title = %event.title, search_days, "no slot found"),
        }
        best.map(|candidate| (candidate.start, candidate.end))
    }

    /// Every admissible candidate for `event`, best first.
    pub fn rank_slots(
        &self,
        event: &Event,
        search_start: DateTime<Utc>,
        search_days: u32,
        preference: Option<&TimePreference>,
    ) -> Vec<SlotCandidate> {
        let search_days = search_days.min(scorer::MAX_SEARCH_DAYS);
        let query = SlotQuery {
            event_type: event.event_type,
            event_duration: self.event_duration(event),
            prep: Duration::minutes(i64::from(event.prep_time)),
            followup: Duration::minutes(i64::from(event.followup_time)),
            search_start,
            search_days,
            step: Duration::minutes(i64::from(self.config.slot_step_minutes)),
            preference,
        };
        // One extra day covers working windows shifted by the zone offset.
        let fetch_end = search_start
            .checked_add_signed(Duration::days(i64::from(search_days) + 1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let busy = self.busy_between(search_start, fetch_end);
        let optimal_hour = self.learner.get_optimal_time(event.event_type);

        scorer::rank_candidates(
            &query,
            &self.profile,
            self.tz,
            &busy,
            optimal_hour,
            &self.config.scoring,
        )
    }

    /// Existing entries overlapping a fixed-time event. Empty when the event
    /// has no start or end.
    pub fn check_conflicts(&self, event: &Event) -> Vec<ConflictRecord> {
        let Some((start, end)) = self.resolve_range(event) else {
            return Vec::new();
        };
        conflict::check_conflicts(
            &self.calendar,
            start,
            end,
            Duration::minutes(i64::from(self.config.conflict_padding_minutes)),
            self.config.expansion_limit,
        )
    }

    /// When `event` conflicts, the best free slot from its original start onward.
    pub fn suggest_alternative(
        &self,
        event: &Event,
        search_days: u32,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if self.check_conflicts(event).is_empty() {
            return None;
        }
        let (start, _) = self.resolve_range(event)?;
        self.find_optimal_slot(event, start, search_days)
    }

    /// Allocate a multi-session task across the horizon. See [`planner::plan_week_schedule`].
    pub fn plan_week_schedule(&mut self, request: &PlanRequest) -> Result<PlanOutcome> {
        planner::plan_week_schedule(&mut self.calendar, request, self.tz, &self.config)
    }

    /// Feed a placed event back into the preference history.
    pub fn record_scheduled(&mut self, event: &Event) {
        self.learner.add_event(event);
    }

    pub fn get_optimal_time(&self, event_type: EventType) -> Option<u32> {
        self.learner.get_optimal_time(event_type)
    }

    pub fn get_optimal_time_on(&self, event_type: EventType, date: NaiveDate) -> Option<u32> {
        self.learner.get_optimal_time_on(event_type, date)
    }

    pub fn suggest_batch_events(&self) -> Vec<BatchSuggestion> {
        self.learner.suggest_batch_events()
    }
}
