//! # slot-engine
//!
//! Availability and scheduling engine for a personal calendar assistant.
//!
//! Turns busy intervals reported by an external calendar into usable free
//! time, scores candidate slots against the user's energy curve and learned
//! habits, detects conflicts, and spreads multi-hour tasks over days and
//! weeks. All searches are bounded and greedy, never globally optimal.
//!
//! ## Modules
//!
//! - [`freebusy`]: merge busy intervals, compute free slots
//! - [`scorer`]: candidate scoring and the optimal-slot scan
//! - [`conflict`]: overlap detection for fixed-time events
//! - [`planner`]: multi-session task allocation across a horizon of weeks
//! - [`learner`]: per-event-type hour preferences and batching suggestions
//! - [`calendar`]: calendar collaborator trait, timestamp parsing, in-memory calendar
//! - [`expander`]: RRULE expansion of recurring calendar entries
//! - [`scheduler`]: per-session facade over all of the above
//! - [`profile`], [`config`], [`meridiem`], [`model`]: inputs and data types
//! - [`error`]: Error types

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod learner;
pub mod meridiem;
pub mod model;
pub mod planner;
pub mod profile;
pub mod scheduler;
pub mod scorer;

pub use calendar::{CalendarProvider, CreatedEvent, MemoryCalendar, RawBusy, RawEvent};
pub use config::{EngineConfig, ScoringWeights};
pub use conflict::{ConflictRecord, Severity};
pub use error::{CalendarError, EngineError};
pub use freebusy::{find_free_slots, merge};
pub use learner::{BatchSuggestion, PreferenceLearner, PreferenceState};
pub use meridiem::MeridiemPolicy;
pub use model::{
    BusyInterval, ChunkSource, Event, EventType, FreeSlot, Priority, ScheduledChunk,
};
pub use planner::{PlanOutcome, PlanRequest};
pub use profile::{DayPeriod, TimePreference, UserProfile, WorkingHours};
pub use scheduler::Scheduler;
pub use scorer::SlotCandidate;
