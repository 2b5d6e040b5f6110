use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Error;
use crate::export::{self, ExportFormat};
use crate::identity::Identity;
use crate::timer::Phase;
use crate::tracker::Tracker;

/// Question waiting for a yes/no answer
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    /// Quitting with an active session: `y` stops and saves, `n` quits anyway
    Quit,
    Clear,
    /// Changing employee/company with an active session: `y` stops it first
    Switch(Identity),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Tracking,
    Report,
    Confirm(Pending),
}

#[derive(Debug)]
pub struct App<C: Clock = SystemClock> {
    pub config: Config,
    pub dirs: AppDirs,
    pub tracker: Tracker<C>,
    pub state: AppState,
    pub status: String,
    pub should_quit: bool,
}

impl<C: Clock> App<C> {
    pub fn new(config: Config, dirs: AppDirs, tracker: Tracker<C>) -> Self {
        let mut app = Self {
            config,
            dirs,
            tracker,
            state: AppState::Tracking,
            status: String::new(),
            should_quit: false,
        };
        app.status = app.ready_status("Ready");
        app
    }

    /// Load the selected employee's sessions, reporting a damaged file in the status bar
    pub fn load_sessions(&mut self) {
        match self.tracker.reload() {
            Ok(_) => self.status = self.ready_status("Ready"),
            Err(e) => {
                warn!(error = %e, "could not load sessions");
                self.status = format!("Could not load sessions: {e}");
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.request_quit();
            return;
        }

        match self.state.clone() {
            AppState::Tracking => self.on_tracking_key(key.code),
            AppState::Report => self.on_report_key(key.code),
            AppState::Confirm(pending) => self.on_confirm_key(key.code, pending),
        }
    }

    fn on_tracking_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('s') | KeyCode::Enter => self.start(),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.pause(),
            KeyCode::Char('e') => {
                self.stop();
            }
            KeyCode::Char('c') => {
                if self.tracker.sessions().is_empty() {
                    self.status = "No sessions to clear.".to_string();
                } else {
                    self.state = AppState::Confirm(Pending::Clear);
                }
            }
            KeyCode::Char('r') => self.state = AppState::Report,
            KeyCode::Char('o') => {
                let next = self.config.next_company(self.tracker.identity());
                self.switch_to(next);
            }
            KeyCode::Char('w') => {
                let next = self.config.next_employee(self.tracker.identity());
                self.switch_to(next);
            }
            KeyCode::Char('j') => {
                let next = self.config.next_position(self.tracker.identity());
                self.switch_to(next);
            }
            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),
            _ => {}
        }
    }

    fn on_report_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('t') => self.export(ExportFormat::Text),
            KeyCode::Char('v') => self.export(ExportFormat::Csv),
            KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc => {
                self.state = AppState::Tracking
            }
            KeyCode::Char('q') => self.request_quit(),
            _ => {}
        }
    }

    fn on_confirm_key(&mut self, code: KeyCode, pending: Pending) {
        let answer = match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(false),
            KeyCode::Esc => None,
            _ => return,
        };
        self.state = AppState::Tracking;

        match (pending, answer) {
            (_, None) => self.status = "Cancelled".to_string(),
            (Pending::Quit, Some(stop_first)) => {
                // an unsaved session keeps the app open so the user sees why
                if !stop_first || self.stop() {
                    self.should_quit = true;
                }
            }
            (Pending::Clear, Some(true)) => match self.tracker.clear() {
                Ok(()) => self.status = "Data cleared | Sessions: 0".to_string(),
                Err(e) => self.status = format!("Could not delete data file: {e}"),
            },
            (Pending::Switch(identity), Some(true)) => {
                if self.stop() {
                    self.switch_to(identity);
                }
            }
            (Pending::Clear, Some(false)) | (Pending::Switch(_), Some(false)) => {
                self.status = "Cancelled".to_string()
            }
        }
    }

    fn start(&mut self) {
        let resuming = self.tracker.phase() == Phase::Paused;
        match self.tracker.start() {
            Ok(()) if resuming => self.status = "Session resumed".to_string(),
            Ok(()) => self.status = "Session started".to_string(),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn pause(&mut self) {
        match self.tracker.pause() {
            Ok(()) => self.status = "Session paused".to_string(),
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Finish the running session. Returns `false` when it could not be saved.
    fn stop(&mut self) -> bool {
        match self.tracker.stop() {
            Ok(_) => {
                self.status = format!(
                    "Session finished. Total sessions: {}",
                    self.tracker.sessions().len()
                );
                true
            }
            Err(Error::Store(e)) => {
                self.status = format!("Session kept in memory, could not save: {e}");
                false
            }
            Err(e) => {
                self.status = e.to_string();
                true
            }
        }
    }

    fn request_quit(&mut self) {
        if self.tracker.has_active_session() {
            self.state = AppState::Confirm(Pending::Quit);
        } else {
            self.should_quit = true;
        }
    }

    fn switch_to(&mut self, identity: Identity) {
        let employee_changed = identity.employee != self.tracker.identity().employee
            || identity.company != self.tracker.identity().company;
        match self.tracker.switch_identity(identity.clone()) {
            Ok(()) if employee_changed => self.status = self.ready_status("Employee changed"),
            Ok(()) => self.status = format!("Position: {}", identity.position),
            Err(Error::ActiveSession { .. }) => {
                self.state = AppState::Confirm(Pending::Switch(identity))
            }
            Err(e) => {
                warn!(error = %e, "identity switched with unreadable sessions");
                self.status = format!("Could not load sessions: {e}");
            }
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let today = self.tracker.timer().clock().now().date();
        let report = self.tracker.report();
        self.status = match export::export(
            &report,
            self.tracker.identity(),
            today,
            format,
            &self.dirs.reports_dir(),
        ) {
            Ok(path) => format!("Report saved: {}", path.display()),
            Err(e) => e.to_string(),
        };
    }

    fn ready_status(&self, prefix: &str) -> String {
        format!(
            "{prefix} | Sessions: {} | Employee: {}",
            self.tracker.sessions().len(),
            self.tracker.identity().employee
        )
    }
}
