use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::clock::{seconds_between, Clock, SystemClock};
use crate::error::TimerError;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Stopwatch for a single work session.
///
/// Time is banked into `accumulated_seconds` on every pause; the open interval
/// since `running_since` is only folded in on pause or stop.
#[derive(Debug)]
pub struct Timer<C: Clock = SystemClock> {
    clock: C,
    phase: Phase,
    accumulated_seconds: f64,
    running_since: Option<NaiveDateTime>,
    started_at: Option<NaiveDateTime>,
}

impl Default for Timer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Timer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            phase: Phase::Idle,
            accumulated_seconds: 0.0,
            running_since: None,
            started_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn has_active_session(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Timestamp of the `start()` that opened the current session
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.started_at
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Begin a new session, or resume a paused one.
    pub fn start(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        match self.phase {
            Phase::Idle => {
                self.accumulated_seconds = 0.0;
                self.started_at = Some(now);
                info!(at = %now, "session started");
            }
            Phase::Paused => {
                info!(banked = self.accumulated_seconds, "session resumed");
            }
            Phase::Running => return Err(self.reject("start")),
        }
        self.running_since = Some(now);
        self.phase = Phase::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.phase != Phase::Running {
            return Err(self.reject("pause"));
        }
        self.fold_open_interval();
        self.phase = Phase::Paused;
        info!(banked = self.accumulated_seconds, "session paused");
        Ok(())
    }

    /// End the active session and hand back the completed record.
    pub fn stop(&mut self) -> Result<Session, TimerError> {
        let started_at = match (self.phase, self.started_at) {
            (Phase::Idle, _) | (_, None) => return Err(self.reject("stop")),
            (_, Some(started_at)) => started_at,
        };
        if self.phase == Phase::Running {
            self.fold_open_interval();
        }

        let session = Session::new(started_at, self.clock.now(), self.accumulated_seconds);
        info!(
            start = %session.start_time(),
            duration = session.duration_seconds(),
            "session stopped"
        );

        self.phase = Phase::Idle;
        self.accumulated_seconds = 0.0;
        self.running_since = None;
        self.started_at = None;
        Ok(session)
    }

    /// Seconds the current session has run so far. Never mutates state.
    pub fn elapsed(&self) -> f64 {
        match (self.phase, self.running_since) {
            (Phase::Running, Some(since)) => {
                self.accumulated_seconds + open_interval(since, self.clock.now())
            }
            _ => self.accumulated_seconds,
        }
    }

    fn fold_open_interval(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated_seconds += open_interval(since, self.clock.now());
        }
    }

    fn reject(&self, op: &'static str) -> TimerError {
        debug!(op, phase = %self.phase, "rejected timer transition");
        TimerError::InvalidTransition {
            op,
            phase: self.phase,
        }
    }
}

// A backwards clock step counts as zero so banked time never shrinks.
fn open_interval(since: NaiveDateTime, now: NaiveDateTime) -> f64 {
    seconds_between(since, now).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn clock() -> ManualClock {
        ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_new_timer_is_idle() {
        let timer = Timer::new(clock());
        assert_eq!(timer.phase(), Phase::Idle);
        assert!(!timer.has_active_session());
        assert_eq!(timer.elapsed(), 0.0);
        assert_eq!(timer.started_at(), None);
    }

    #[test]
    fn test_pause_and_resume_accumulates_running_time_only() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        let opened = clock.now();

        timer.start().unwrap();
        clock.advance_secs(10);
        timer.pause().unwrap();
        clock.advance_secs(5);
        assert_eq!(timer.elapsed(), 10.0);
        timer.start().unwrap();
        clock.advance_secs(7);
        let session = timer.stop().unwrap();

        assert_eq!(session.duration_seconds(), 17.0);
        assert_eq!(session.start_time(), opened);
        assert_eq!(session.end_time(), clock.now());
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn test_elapsed_is_monotonic_while_running() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        timer.start().unwrap();

        let mut last = timer.elapsed();
        for step in 1..=5 {
            clock.advance_secs(step);
            let now = timer.elapsed();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 15.0);
        // querying does not bank anything
        assert_eq!(timer.elapsed(), 15.0);
    }

    #[test]
    fn test_stop_while_idle_is_rejected() {
        let mut timer = Timer::new(clock());
        assert_matches!(
            timer.stop(),
            Err(TimerError::InvalidTransition {
                op: "stop",
                phase: Phase::Idle
            })
        );
        assert_matches!(timer.pause(), Err(TimerError::InvalidTransition { op: "pause", .. }));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        timer.start().unwrap();
        clock.advance_secs(3);
        assert_matches!(
            timer.start(),
            Err(TimerError::InvalidTransition {
                op: "start",
                phase: Phase::Running
            })
        );
        assert_eq!(timer.elapsed(), 3.0);
    }

    #[test]
    fn test_pause_while_paused_is_rejected() {
        let mut timer = Timer::new(clock());
        timer.start().unwrap();
        timer.pause().unwrap();
        assert_matches!(
            timer.pause(),
            Err(TimerError::InvalidTransition {
                phase: Phase::Paused,
                ..
            })
        );
    }

    #[test]
    fn test_stop_from_paused_skips_paused_time() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        timer.start().unwrap();
        clock.advance_secs(20);
        timer.pause().unwrap();
        clock.advance_secs(600);
        let session = timer.stop().unwrap();
        assert_eq!(session.duration_seconds(), 20.0);
        assert_eq!(
            (session.end_time() - session.start_time()).num_seconds(),
            620
        );
    }

    #[test]
    fn test_backwards_clock_does_not_shrink_elapsed() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        timer.start().unwrap();
        clock.advance_secs(30);
        timer.pause().unwrap();
        timer.start().unwrap();
        clock.advance_secs(-60);
        assert_eq!(timer.elapsed(), 30.0);
        let session = timer.stop().unwrap();
        assert_eq!(session.duration_seconds(), 30.0);
    }

    #[test]
    fn test_new_session_resets_accumulated() {
        let clock = clock();
        let mut timer = Timer::new(clock.clone());
        timer.start().unwrap();
        clock.advance_secs(4);
        timer.stop().unwrap();

        timer.start().unwrap();
        clock.advance_secs(2);
        assert_eq!(timer.elapsed(), 2.0);
        assert_eq!(timer.started_at(), Some(clock.now() - chrono::Duration::seconds(2)));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Running.to_string(), "running");
        assert_eq!(Phase::Paused.to_string(), "paused");
    }
}
