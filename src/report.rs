use chrono::NaiveDate;
use itertools::Itertools;

use crate::session::Session;
use crate::util::mean;

/// Sessions that started on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub sessions: Vec<Session>,
    pub total_seconds: f64,
}

impl DayGroup {
    /// `YYYY-MM-DD` label used as the group key
    pub fn label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Per-day breakdown plus overall totals, most recent day first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub days: Vec<DayGroup>,
    pub total_seconds: f64,
    pub session_count: usize,
    pub average_seconds: f64,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.session_count == 0
    }
}

/// Group sessions by start date.
///
/// Days are ordered newest first; inside a day sessions keep their input order.
pub fn build(sessions: &[Session]) -> Report {
    let days: Vec<DayGroup> = sessions
        .iter()
        .into_group_map_by(|s| s.day())
        .into_iter()
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .map(|(date, group)| DayGroup {
            date,
            total_seconds: group.iter().map(|s| s.duration_seconds()).sum(),
            sessions: group.into_iter().cloned().collect(),
        })
        .collect();

    let durations: Vec<f64> = sessions.iter().map(Session::duration_seconds).collect();

    Report {
        days,
        total_seconds: durations.iter().sum(),
        session_count: durations.len(),
        average_seconds: mean(&durations).unwrap_or(0.0),
    }
}
