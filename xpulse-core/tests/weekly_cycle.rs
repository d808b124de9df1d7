use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use xpulse_core::{
    CsvStore, FixedClock, MemoryStore, Priority, TaskStatus, Tracker, TrackerConfig, TrackerError,
    Urgency,
};

/// Sunday 2026-10-11 00:00 in Asia/Kolkata.
fn sunday_ist() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 10, 18, 30, 0).unwrap()
}

fn csv_tracker(path: &std::path::Path, now: DateTime<Utc>) -> Tracker<CsvStore, FixedClock> {
    Tracker::new(CsvStore::new(path), FixedClock::new(now), TrackerConfig::default()).unwrap()
}

#[test]
fn tasks_survive_a_reopen_of_the_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.csv");

    let t = csv_tracker(&path, sunday_ist());
    let a = t.add_task("Plan week", Priority::High, None).unwrap();
    let b = t.add_bonus_task("Clean garage", None).unwrap();
    t.clock().advance(Duration::hours(2));
    t.complete_task(&a.id).unwrap();
    drop(t);

    let reopened = csv_tracker(&path, sunday_ist() + Duration::hours(3));
    let tasks = reopened.tasks().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(tasks[1].text, "[BONUS] Clean garage");
    assert!(tasks[1].is_bonus);

    let snap = reopened.snapshot().unwrap();
    assert_eq!(snap.pie_counts, [1, 1]);
    assert_eq!(snap.total_xp, 50);
    assert_eq!(snap.pending[0].id, b.id);
    assert_eq!(snap.pending[0].urgency, Some(Urgency::Safe));
    assert_eq!(snap.bar_counts.curr, [2, 0, 0, 0, 0, 0, 0]);
    assert!(snap.show_weekly_reminder);
    assert!(!snap.show_bonus_panel);

    assert!(matches!(
        reopened.complete_task(&a.id),
        Err(TrackerError::AlreadyCompleted(_))
    ));
}

#[test]
fn streak_boosts_tasks_added_after_a_completion() {
    let t = Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), TrackerConfig::default())
        .unwrap();
    let first = t.add_task("warm up", Priority::Medium, None).unwrap();
    assert_eq!(first.xp, 50);

    t.complete_task(&first.id).unwrap();
    t.clock().advance(Duration::hours(1));
    let second = t.add_task("follow up", Priority::Medium, None).unwrap();
    assert_eq!(second.xp, 55);
}

#[test]
fn sunday_tasks_keep_last_weeks_streak() {
    let t = Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), TrackerConfig::default())
        .unwrap();
    let first = t.add_task("week one", Priority::Medium, None).unwrap();
    t.clock().advance(Duration::days(2));
    t.complete_task(&first.id).unwrap();

    // Sunday 00:00 of the next week, nothing completed there yet.
    t.clock().set(sunday_ist() + Duration::days(7));
    assert_eq!(t.snapshot().unwrap().streak, 1);
    let second = t.add_task("week two", Priority::Medium, None).unwrap();
    assert_eq!(second.xp, 55);

    // A whole empty week breaks the run.
    t.clock().set(sunday_ist() + Duration::days(21));
    let third = t.add_task("week four", Priority::Medium, None).unwrap();
    assert_eq!(third.xp, 50);
}

#[test]
fn tokens_are_rate_limited_per_week_and_month() {
    let t = Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), TrackerConfig::default())
        .unwrap();

    let ids: Vec<String> = (0..5)
        .map(|i| t.add_task(&format!("task {i}"), Priority::Medium, None).unwrap().id)
        .collect();
    t.clock().advance(Duration::hours(1));

    let mut earned = Vec::new();
    for id in &ids {
        earned.push(t.complete_task(id).unwrap().token_earned);
    }
    // 4 x 50 XP reaches one token; the fifth completion cannot add another.
    assert_eq!(earned, vec![0, 0, 0, 1, 0]);
    let snap = t.snapshot().unwrap();
    assert_eq!(snap.tokens, 1);
    assert_eq!(snap.total_xp, 250);
    assert_eq!(snap.streak, 1);

    // Next week, still October: the monthly limit holds.
    t.clock().set(sunday_ist() + Duration::days(7));
    let next = t.add_task("october again", Priority::Medium, None).unwrap();
    assert_eq!(next.xp, 55);
    t.clock().advance(Duration::hours(1));
    assert_eq!(t.complete_task(&next.id).unwrap().token_earned, 0);
    assert_eq!(t.snapshot().unwrap().tokens, 1);
    assert_eq!(t.snapshot().unwrap().streak, 2);

    // November 1st is a new month and a new week.
    t.clock().set(sunday_ist() + Duration::days(21));
    let nov: Vec<String> = (0..2)
        .map(|i| t.add_task(&format!("nov {i}"), Priority::Medium, None).unwrap().id)
        .collect();
    t.clock().advance(Duration::hours(1));
    // Pool carries 105 XP; the second November completion takes it past 200.
    assert_eq!(t.complete_task(&nov[0]).unwrap().token_earned, 0);
    assert_eq!(t.complete_task(&nov[1]).unwrap().token_earned, 1);
    assert_eq!(t.snapshot().unwrap().tokens, 2);

    let ledger = t.rewards().token_ledger(&t.tasks().unwrap());
    assert_eq!(ledger.issued.len(), 2);
}

#[test]
fn unfinished_work_rolls_over_with_a_penalty() {
    let t = Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), TrackerConfig::default())
        .unwrap();
    let stale = t.add_task("slipped", Priority::Low, None).unwrap();
    assert_eq!(stale.xp, 50);

    // Tuesday of the following week.
    t.clock().set(sunday_ist() + Duration::days(9));
    let snap = t.snapshot().unwrap();
    assert!(snap.pending.is_empty());
    assert_eq!(snap.carried_over.len(), 1);
    assert_eq!(snap.carried_over[0].xp, 40);
    assert_eq!(snap.carried_over[0].urgency, Some(Urgency::Overdue));
    assert!(snap.show_bonus_panel);

    let done = t.complete_task(&stale.id).unwrap();
    assert_eq!(t.rewards().awarded_xp(&done), 40);
    assert!(t.snapshot().unwrap().carried_over.is_empty());
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let t = Arc::new(
        Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), TrackerConfig::default())
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|w| {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for i in 0..5 {
                    t.add_task(&format!("worker {w} task {i}"), Priority::Medium, None)
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let tasks = t.tasks().unwrap();
    assert_eq!(tasks.len(), 40);
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), 40);
    assert!(ids.contains("2026-10-11-040"));
}

#[test]
fn unknown_timezone_is_a_config_error() {
    let cfg = TrackerConfig {
        timezone: "Nowhere/Special".to_string(),
        ..TrackerConfig::default()
    };
    let err = Tracker::new(MemoryStore::new(), FixedClock::new(sunday_ist()), cfg).err();
    assert!(matches!(err, Some(TrackerError::Config(_))));
}
