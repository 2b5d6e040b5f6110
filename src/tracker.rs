use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result, StoreError};
use crate::identity::Identity;
use crate::report::{self, Report};
use crate::session::Session;
use crate::store::SessionStore;
use crate::timer::{Phase, Timer};

/// Time tracking for one selected identity.
///
/// Owns the timer and the session store and routes completed sessions into
/// the current employee's file.
#[derive(Debug)]
pub struct Tracker<C: Clock = SystemClock> {
    identity: Identity,
    timer: Timer<C>,
    store: SessionStore,
}

impl<C: Clock> Tracker<C> {
    /// Does not touch the disk; call [`Tracker::reload`] to read existing sessions.
    pub fn new(identity: Identity, store: SessionStore, clock: C) -> Self {
        Self {
            identity,
            timer: Timer::new(clock),
            store,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn timer(&self) -> &Timer<C> {
        &self.timer
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    pub fn has_active_session(&self) -> bool {
        self.timer.has_active_session()
    }

    pub fn sessions(&self) -> &[Session] {
        self.store.sessions(&self.identity.employee)
    }

    /// Read the current employee's sessions from disk.
    pub fn reload(&mut self) -> Result<&[Session], StoreError> {
        self.store.load(&self.identity.employee)
    }

    pub fn start(&mut self) -> Result<()> {
        Ok(self.timer.start()?)
    }

    pub fn pause(&mut self) -> Result<()> {
        Ok(self.timer.pause()?)
    }

    /// Finish the active session and persist it.
    ///
    /// A [`StoreError`] here means the file could not be written; the session
    /// is still recorded in memory and will be written with the next save.
    pub fn stop(&mut self) -> Result<Session> {
        let session = self.timer.stop()?;
        self.store
            .append_and_save(&self.identity.employee, session.clone())?;
        Ok(session)
    }

    pub fn elapsed(&self) -> f64 {
        self.timer.elapsed()
    }

    /// Stored durations plus the live session
    pub fn total_elapsed(&self) -> f64 {
        self.sessions()
            .iter()
            .map(Session::duration_seconds)
            .sum::<f64>()
            + self.timer.elapsed()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear(&self.identity.employee)?;
        info!(employee = %self.identity.employee, "sessions cleared");
        Ok(())
    }

    /// Point the tracker at a different identity.
    ///
    /// A new company or employee is refused while a session is active so its
    /// time is never filed under the wrong employee. Changing only the
    /// position is always allowed and keeps the loaded sessions.
    /// A corrupt file for the new employee still switches, with the error returned.
    pub fn switch_identity(&mut self, identity: Identity) -> Result<()> {
        if identity == self.identity {
            return Ok(());
        }
        let retarget = identity.employee != self.identity.employee
            || identity.company != self.identity.company;
        if retarget && self.timer.has_active_session() {
            return Err(Error::ActiveSession {
                employee: self.identity.employee.clone(),
            });
        }
        let reload = identity.employee != self.identity.employee;
        info!(
            company = %identity.company,
            employee = %identity.employee,
            position = %identity.position,
            "identity selected"
        );
        self.identity = identity;
        if reload {
            self.reload()?;
        }
        Ok(())
    }

    pub fn report(&self) -> Report {
        report::build(self.sessions())
    }
}
