//! `slots` CLI: query free time, pick slots, check conflicts and plan
//! multi-session tasks against a calendar exported as JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots of at least 45 minutes on one day
//! slots --calendar cal.json free --from 2026-03-02T09:00:00Z --to 2026-03-02T18:00:00Z --min-minutes 45
//!
//! # Best slot for a 90-minute focus block in the next week, mornings only
//! slots --calendar cal.json --profile me.json suggest --title "Write report" --type focus \
//!     --duration 90 --from 2026-03-02T00:00:00Z --period morning
//!
//! # Conflicts for a fixed-time event, with an alternative if it clashes
//! slots --calendar cal.json conflicts --title "Sync" --start 2026-03-02T10:30:00Z --end 2026-03-02T11:30:00Z
//!
//! # Spread 10 hours over the next two weeks in 2-hour chunks, without writing
//! slots --calendar cal.json plan --summary "Thesis" --total-hours 10 --chunk-hours 2 --dry-run
//! ```
//!
//! Results are printed as pretty JSON on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use slot_engine::calendar::parse_timestamp;
use slot_engine::{
    DayPeriod, EngineConfig, Event, EventType, MemoryCalendar, PlanRequest, RawEvent, Scheduler,
    TimePreference, UserProfile, WorkingHours,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Find free time, pick slots and plan tasks against a calendar"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Calendar entries as a JSON array (empty calendar if omitted)
    #[arg(long, global = true)]
    calendar: Option<PathBuf>,

    /// User profile as JSON (defaults: UTC, Mon-Fri 09:00-17:00)
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Engine configuration as TOML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List free slots in a window
    Free {
        #[arg(long, value_parser = timestamp)]
        from: DateTime<Utc>,
        #[arg(long, value_parser = timestamp)]
        to: DateTime<Utc>,
        /// Shortest slot worth reporting, in minutes
        #[arg(long, default_value_t = 30)]
        min_minutes: u32,
    },
    /// Pick the best slot for a flexible event
    Suggest {
        #[arg(long)]
        title: String,
        #[arg(long = "type", default_value = "focus")]
        event_type: EventType,
        /// Event length in minutes (profile/config default if omitted)
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, default_value_t = 0)]
        prep: u32,
        #[arg(long, default_value_t = 0)]
        followup: u32,
        /// Start of the search (now if omitted)
        #[arg(long, value_parser = timestamp)]
        from: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Restrict each day to a part of the day
        #[arg(long, value_enum)]
        period: Option<Period>,
        /// Number of ranked alternatives to include
        #[arg(long, default_value_t = 0)]
        alternatives: usize,
    },
    /// Check a fixed-time event against existing entries
    Conflicts {
        #[arg(long)]
        title: String,
        #[arg(long = "type", default_value = "meeting")]
        event_type: EventType,
        #[arg(long, value_parser = timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = timestamp)]
        end: DateTime<Utc>,
        /// Days searched for an alternative when the event conflicts
        #[arg(long, default_value_t = 7)]
        suggest_days: u32,
    },
    /// Spread a multi-hour task over free time
    Plan {
        #[arg(long)]
        summary: String,
        #[arg(long = "type", default_value = "focus")]
        event_type: EventType,
        #[arg(long)]
        total_hours: f64,
        #[arg(long)]
        chunk_hours: f64,
        /// Daily window as HH:MM-HH:MM, local to the profile's time zone
        #[arg(long, value_parser = daily_window, default_value = "09:00-18:00")]
        window: WorkingHours,
        #[arg(long, default_value_t = 2)]
        weeks: u32,
        /// Nothing is placed before this instant (now if omitted)
        #[arg(long, value_parser = timestamp)]
        now: Option<DateTime<Utc>>,
        /// Compute chunks without writing them to the calendar
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl From<Period> for DayPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Morning => DayPeriod::Morning,
            Period::Afternoon => DayPeriod::Afternoon,
            Period::Evening => DayPeriod::Evening,
            Period::Night => DayPeriod::Night,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let calendar = match &cli.calendar {
        Some(path) => load_calendar(path)?,
        None => MemoryCalendar::new(),
    };
    let profile = match &cli.profile {
        Some(path) => load_profile(path)?,
        None => UserProfile::default(),
    };
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let mut scheduler =
        Scheduler::new(calendar, profile, config).context("Failed to start scheduler")?;

    let output = match cli.command {
        Commands::Free {
            from,
            to,
            min_minutes,
        } => {
            let slots = scheduler.find_free_slots(from, to, Duration::minutes(i64::from(min_minutes)));
            json!({ "free_slots": slots })
        }
        Commands::Suggest {
            title,
            event_type,
            duration,
            prep,
            followup,
            from,
            days,
            period,
            alternatives,
        } => {
            let mut event = Event::new(title, event_type).with_buffers(prep, followup);
            if let Some(minutes) = duration {
                event = event.with_duration(minutes);
            }
            let preference = period.map(|p| TimePreference::from_period(p.into()));
            let search_start = from.unwrap_or_else(Utc::now);
            let ranked = scheduler.rank_slots(&event, search_start, days, preference.as_ref());
            debug!(candidates = ranked.len(), "ranked slots");

            let mut ranked = ranked.into_iter();
            let best = ranked.next();
            let others: Vec<_> = ranked.take(alternatives).collect();
            json!({ "event": event, "slot": best, "alternatives": others })
        }
        Commands::Conflicts {
            title,
            event_type,
            start,
            end,
            suggest_days,
        } => {
            let event = Event::new(title, event_type).with_times(start, end);
            let conflicts = scheduler.check_conflicts(&event);
            let alternative = if conflicts.is_empty() {
                None
            } else {
                scheduler
                    .suggest_alternative(&event, suggest_days)
                    .map(|(start, end)| json!({ "start": start, "end": end }))
            };
            json!({ "conflicts": conflicts, "alternative": alternative })
        }
        Commands::Plan {
            summary,
            event_type,
            total_hours,
            chunk_hours,
            window,
            weeks,
            now,
            dry_run,
        } => {
            let mut request =
                PlanRequest::new(summary, total_hours, chunk_hours, now.unwrap_or_else(Utc::now))
                    .with_event_type(event_type)
                    .with_window(window)
                    .with_max_weeks(weeks);
            if dry_run {
                request = request.dry_run();
            }
            let outcome = scheduler
                .plan_week_schedule(&request)
                .context("Failed to plan task")?;
            json!({ "complete": outcome.is_complete(), "outcome": outcome })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_calendar(path: &Path) -> Result<MemoryCalendar> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read calendar: {}", path.display()))?;
    let events: Vec<RawEvent> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse calendar: {}", path.display()))?;
    Ok(MemoryCalendar::with_events(events))
}

fn load_profile(path: &Path) -> Result<UserProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse profile: {}", path.display()))
}

fn timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(value).map_err(|e| e.to_string())
}

/// Parse `HH:MM-HH:MM` into a daily window.
fn daily_window(value: &str) -> std::result::Result<WorkingHours, String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{}'", value))?;
    let parse = |part: &str| {
        NaiveTime::parse_from_str(part.trim(), "%H:%M")
            .map_err(|_| format!("invalid clock time '{}'", part))
    };
    let window = WorkingHours::new(parse(start)?, parse(end)?);
    if window.start >= window.end {
        return Err(format!("window '{}' must start before it ends", value));
    }
    Ok(window)
}
