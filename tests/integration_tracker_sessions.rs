use std::fs;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::tempdir;

use timesheet::clock::ManualClock;
use timesheet::error::{Error, StoreError, TimerError};
use timesheet::identity::Identity;
use timesheet::report;
use timesheet::session::{Session, TIMESTAMP_FORMAT};
use timesheet::store::SessionStore;
use timesheet::tracker::Tracker;

/// Integration tests covering the tracker, its session files and the report
/// built from them.

fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
}

#[test]
fn sessions_survive_a_restart() {
    let dir = tempdir().unwrap();
    let identity = Identity::new("WebStead", "dmitryace", "Backend developer");
    let clock = ManualClock::new(at("2024-01-01 08:00:00"));

    let mut tracker = Tracker::new(identity.clone(), SessionStore::new(dir.path()), clock.clone());
    tracker.reload().unwrap();
    tracker.start().unwrap();
    clock.advance_secs(10);
    tracker.pause().unwrap();
    clock.advance_secs(5);
    tracker.start().unwrap();
    clock.advance_secs(7);
    let first = tracker.stop().unwrap();
    assert_eq!(first.duration_seconds(), 17.0);
    assert_eq!(first.start_time(), at("2024-01-01 08:00:00"));
    assert_eq!(first.end_time(), at("2024-01-01 08:00:22"));

    clock.set(at("2024-01-02 09:00:00"));
    tracker.start().unwrap();
    clock.advance_secs(100);
    tracker.stop().unwrap();

    let mut restarted = Tracker::new(identity, SessionStore::new(dir.path()), clock.clone());
    let sessions = restarted.reload().unwrap().to_vec();
    assert_eq!(sessions, tracker.sessions());
    assert_eq!(restarted.total_elapsed(), 117.0);
}

#[test]
fn report_groups_saved_sessions_by_day() {
    let dir = tempdir().unwrap();
    let mut store = SessionStore::new(dir.path());
    for (start, end, secs) in [
        ("2024-01-02 09:00:00", "2024-01-02 09:01:40", 100.0),
        ("2024-01-01 12:00:00", "2024-01-01 12:00:50", 50.0),
        ("2024-01-02 13:00:00", "2024-01-02 13:03:20", 200.0),
    ] {
        store
            .append_and_save("ivanov_ivan", Session::new(at(start), at(end), secs))
            .unwrap();
    }

    let mut reloaded = SessionStore::new(dir.path());
    let report = report::build(reloaded.load("ivanov_ivan").unwrap());

    let days: Vec<String> = report.days.iter().map(|d| d.label()).collect();
    assert_eq!(days, vec!["2024-01-02", "2024-01-01"]);
    let totals: Vec<f64> = report.days.iter().map(|d| d.total_seconds).collect();
    assert_eq!(totals, vec![300.0, 50.0]);
    assert_eq!(report.total_seconds, 350.0);
    assert_eq!(report.session_count, 3);
    assert!((report.average_seconds - 350.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.days[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
}

#[test]
fn corrupt_file_is_surfaced_and_tracking_continues() {
    let dir = tempdir().unwrap();
    let identity = Identity::new("WebStead", "dmitryace", "Backend developer");
    let clock = ManualClock::new(at("2024-01-01 08:00:00"));
    let mut tracker = Tracker::new(identity, SessionStore::new(dir.path()), clock.clone());
    fs::write(dir.path().join("sessions_dmitryace.json"), "not json at all").unwrap();

    assert_matches!(tracker.reload(), Err(StoreError::CorruptData { .. }));
    assert!(tracker.sessions().is_empty());

    tracker.start().unwrap();
    clock.advance_secs(3);
    tracker.stop().unwrap();
    assert_eq!(tracker.sessions().len(), 1);
}

#[test]
fn invalid_transitions_are_typed_errors() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(at("2024-01-01 08:00:00"));
    let mut tracker = Tracker::new(
        Identity::new("WebStead", "dmitryace", "Backend developer"),
        SessionStore::new(dir.path()),
        clock,
    );

    assert_matches!(
        tracker.pause(),
        Err(Error::Timer(TimerError::InvalidTransition { op: "pause", .. }))
    );
    assert_matches!(
        tracker.stop(),
        Err(Error::Timer(TimerError::InvalidTransition { op: "stop", .. }))
    );
    tracker.start().unwrap();
    assert_matches!(
        tracker.start(),
        Err(Error::Timer(TimerError::InvalidTransition { op: "start", .. }))
    );
    assert!(!dir.path().join("sessions_dmitryace.json").exists());
}

#[test]
fn clear_on_fresh_identity_is_a_no_op() {
    let dir = tempdir().unwrap();
    let mut tracker = Tracker::new(
        Identity::new("TechSolutions", "petrov_petr", "DevOps engineer"),
        SessionStore::new(dir.path()),
        ManualClock::new(at("2024-01-01 08:00:00")),
    );
    tracker.clear().unwrap();
    assert!(tracker.sessions().is_empty());
}

#[test]
fn employees_with_lossy_names_keep_separate_files() {
    let dir = tempdir().unwrap();
    let mut store = SessionStore::new(dir.path());
    let s = Session::new(at("2024-01-01 08:00:00"), at("2024-01-01 08:00:05"), 5.0);
    store.append_and_save("Иван", s.clone()).unwrap();
    store.append_and_save("Пётр", s).unwrap();

    assert_ne!(store.path_for("Иван"), store.path_for("Пётр"));
    let mut fresh = SessionStore::new(dir.path());
    assert_eq!(fresh.load("Иван").unwrap().len(), 1);
    assert_eq!(fresh.load("Пётр").unwrap().len(), 1);
}
