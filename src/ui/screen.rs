use ratatui::Frame;

use crate::{
    app::{App, AppState},
    clock::Clock,
    ui::{render_confirm, render_report},
};

/// A UI screen boundary: renders the app for one state
pub trait Screen<C: Clock> {
    fn render(&self, app: &App<C>, f: &mut Frame);
}

/// Clocks and selection, rendered by the `App` widget
pub struct TrackingScreen;

impl<C: Clock> Screen<C> for TrackingScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct ReportScreen;

impl<C: Clock> Screen<C> for ReportScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_report(app, f);
    }
}

pub struct ConfirmScreen;

impl<C: Clock> Screen<C> for ConfirmScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_confirm(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock>(state: &AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Tracking => Box::new(TrackingScreen),
        AppState::Report => Box::new(ReportScreen),
        AppState::Confirm(_) => Box::new(ConfirmScreen),
    }
}
