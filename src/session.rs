use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wire format of persisted timestamps: local wall clock, no zone, whole seconds
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A completed work interval.
///
/// `duration_seconds` is the time the timer actually ran, which can differ from
/// `end_time - start_time` when the session was paused or the host clock moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord", into = "SessionRecord")]
pub struct Session {
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    duration_seconds: f64,
}

impl Session {
    /// Build a session, truncating both timestamps to whole seconds.
    pub fn new(start_time: NaiveDateTime, end_time: NaiveDateTime, duration_seconds: f64) -> Self {
        Self {
            start_time: truncate_to_secs(start_time),
            end_time: truncate_to_secs(end_time),
            duration_seconds: duration_seconds.max(0.0),
        }
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Calendar day the session is filed under
    pub fn day(&self) -> NaiveDate {
        self.start_time.date()
    }
}

/// On-disk shape: `["start", "end", duration]`
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord(String, String, f64);

impl From<Session> for SessionRecord {
    fn from(s: Session) -> Self {
        SessionRecord(
            s.start_time.format(TIMESTAMP_FORMAT).to_string(),
            s.end_time.format(TIMESTAMP_FORMAT).to_string(),
            s.duration_seconds,
        )
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = String;

    fn try_from(r: SessionRecord) -> Result<Self, Self::Error> {
        let start_time = parse_timestamp(&r.0)?;
        let end_time = parse_timestamp(&r.1)?;
        if !r.2.is_finite() || r.2 < 0.0 {
            return Err(format!("invalid duration {}", r.2));
        }
        Ok(Session {
            start_time,
            end_time,
            duration_seconds: r.2,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}

fn truncate_to_secs(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}
