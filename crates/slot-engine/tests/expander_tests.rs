//! Tests for recurring-entry expansion into busy intervals.

use chrono::{DateTime, Duration, TimeZone, Utc};
use slot_engine::calendar::{busy_from_events, CalendarProvider, MemoryCalendar, RawEvent};
use slot_engine::expander::expand_occurrences;
use slot_engine::EngineError;

fn at(month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, hour, min, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Basic rules
// ---------------------------------------------------------------------------

#[test]
fn weekly_mon_wed_fri_within_two_weeks() {
    let result = expand_occurrences(
        "FREQ=WEEKLY;BYDAY=MO,WE,FR",
        at(3, 2, 10, 0), // Monday
        at(3, 2, 10, 45),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 14, 0, 0),
        500,
    )
    .expect("should expand successfully");

    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(
        starts,
        vec![
            at(3, 2, 10, 0),
            at(3, 4, 10, 0),
            at(3, 6, 10, 0),
            at(3, 9, 10, 0),
            at(3, 11, 10, 0),
            at(3, 13, 10, 0),
        ]
    );
    for occurrence in &result {
        assert_eq!(occurrence.duration(), Duration::minutes(45));
    }
}

#[test]
fn count_in_rule_is_respected() {
    let result = expand_occurrences(
        "FREQ=DAILY;COUNT=3",
        at(3, 2, 9, 0),
        at(3, 2, 9, 30),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    )
    .expect("should expand successfully");

    assert_eq!(result.len(), 3, "COUNT=3 should produce 3 instances");
    assert_eq!(result[2].start, at(3, 4, 9, 0));
}

#[test]
fn rrule_prefix_is_accepted() {
    let result = expand_occurrences(
        "RRULE:FREQ=DAILY;COUNT=2",
        at(3, 2, 9, 0),
        at(3, 2, 9, 30),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    )
    .expect("should expand successfully");

    assert_eq!(result.len(), 2);
}

#[test]
fn only_occurrences_overlapping_window_are_returned() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        at(3, 2, 9, 0),
        at(3, 2, 10, 0),
        "UTC",
        at(3, 5, 9, 30),
        at(3, 7, 0, 0),
        500,
    )
    .expect("should expand successfully");

    // Mar 5 09:00-10:00 overlaps the window start, Mar 6 is inside.
    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![at(3, 5, 9, 0), at(3, 6, 9, 0)]);
}

#[test]
fn rule_starting_after_window_yields_nothing() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        at(4, 1, 9, 0),
        at(4, 1, 10, 0),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    )
    .expect("should expand successfully");

    assert!(result.is_empty());
}

// ---------------------------------------------------------------------------
// DST
// ---------------------------------------------------------------------------

#[test]
fn weekly_meeting_keeps_wall_clock_across_spring_forward() {
    // Monday 10:00 Berlin: 09:00 UTC in CET, 08:00 UTC after the Mar 29 switch to CEST.
    let result = expand_occurrences(
        "FREQ=WEEKLY",
        at(3, 23, 9, 0),
        at(3, 23, 10, 0),
        "Europe/Berlin",
        at(3, 22, 0, 0),
        at(4, 5, 0, 0),
        500,
    )
    .expect("should expand successfully");

    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![at(3, 23, 9, 0), at(3, 30, 8, 0)]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn empty_rule_is_rejected() {
    let result = expand_occurrences(
        "",
        at(3, 2, 9, 0),
        at(3, 2, 10, 0),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    );
    assert!(matches!(result, Err(EngineError::InvalidRule(_))));
}

#[test]
fn unknown_timezone_is_rejected() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        at(3, 2, 9, 0),
        at(3, 2, 10, 0),
        "Mars/Olympus_Mons",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    );
    assert!(matches!(result, Err(EngineError::InvalidTimezone(_))));
}

#[test]
fn garbage_rule_is_rejected() {
    let result = expand_occurrences(
        "FREQ=SOMETIMES",
        at(3, 2, 9, 0),
        at(3, 2, 10, 0),
        "UTC",
        at(3, 1, 0, 0),
        at(3, 31, 0, 0),
        500,
    );
    assert!(matches!(result, Err(EngineError::InvalidRule(_))));
}

// ---------------------------------------------------------------------------
// Long-running series
// ---------------------------------------------------------------------------

fn since_2024(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

#[test]
fn series_started_long_before_window_still_occurs_in_it() {
    // Over 790 daily occurrences precede the window.
    let result = expand_occurrences(
        "FREQ=DAILY",
        since_2024(10),
        since_2024(11),
        "UTC",
        at(3, 2, 9, 0),
        at(3, 2, 18, 0),
        500,
    )
    .unwrap();

    let ranges: Vec<_> = result.iter().map(|o| (o.start, o.end)).collect();
    assert_eq!(ranges, vec![(at(3, 2, 10, 0), at(3, 2, 11, 0))]);
}

#[test]
fn limit_counts_only_occurrences_inside_window() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        since_2024(10),
        since_2024(11),
        "UTC",
        at(3, 2, 0, 0),
        at(3, 9, 0, 0),
        3,
    )
    .unwrap();

    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![at(3, 2, 10, 0), at(3, 3, 10, 0), at(3, 4, 10, 0)]);
}

#[test]
fn occurrence_straddling_window_start_is_kept() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        since_2024(10),
        since_2024(11),
        "UTC",
        at(3, 2, 10, 30),
        at(3, 2, 12, 0),
        500,
    )
    .unwrap();

    let ranges: Vec<_> = result.iter().map(|o| (o.start, o.end)).collect();
    assert_eq!(ranges, vec![(at(3, 2, 10, 0), at(3, 2, 11, 0))]);
}

#[test]
fn utc_alias_zone_expands_like_utc() {
    let result = expand_occurrences(
        "FREQ=DAILY",
        since_2024(10),
        since_2024(11),
        "Etc/UTC",
        at(3, 2, 0, 0),
        at(3, 4, 0, 0),
        500,
    )
    .unwrap();

    let starts: Vec<_> = result.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![at(3, 2, 10, 0), at(3, 3, 10, 0)]);
}

#[test]
fn old_daily_meeting_shows_up_in_freebusy() {
    let calendar = MemoryCalendar::with_events(vec![RawEvent::new(
        "Daily standup",
        since_2024(10),
        since_2024(11),
    )
    .recurring("FREQ=DAILY", "UTC")]);

    let periods = calendar
        .query_freebusy(at(3, 2, 9, 0), at(3, 2, 18, 0), "primary")
        .unwrap();

    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start, at(3, 2, 10, 0).to_rfc3339());
    assert_eq!(periods[0].end, at(3, 2, 11, 0).to_rfc3339());
}

// ---------------------------------------------------------------------------
// Busy list construction
// ---------------------------------------------------------------------------

#[test]
fn busy_list_merges_recurring_and_single_entries() {
    let events = vec![
        RawEvent::new("Standup", at(3, 2, 9, 0), at(3, 2, 9, 30)).recurring("FREQ=DAILY", "UTC"),
        RawEvent::new("Planning", at(3, 3, 9, 15), at(3, 3, 11, 0)),
    ];

    let busy = busy_from_events(&events, at(3, 2, 0, 0), at(3, 4, 0, 0), 500);

    let ranges: Vec<_> = busy.iter().map(|b| (b.start, b.end)).collect();
    assert_eq!(
        ranges,
        vec![
            (at(3, 2, 9, 0), at(3, 2, 9, 30)),
            (at(3, 3, 9, 0), at(3, 3, 11, 0)),
        ]
    );
}

#[test]
fn busy_list_skips_unparsable_entries() {
    let mut broken = RawEvent::new("Broken", at(3, 2, 9, 0), at(3, 2, 10, 0));
    broken.end = "soon".to_string();
    let events = vec![broken, RawEvent::new("Fine", at(3, 2, 11, 0), at(3, 2, 12, 0))];

    let busy = busy_from_events(&events, at(3, 2, 0, 0), at(3, 3, 0, 0), 500);

    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].start, at(3, 2, 11, 0));
}
