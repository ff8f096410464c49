//! TUI application state and key handling.

use crate::poller::PollerState;
use crate::view::StatusReport;
use crossterm::event::KeyCode;

/// Application running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Application is running normally
    Running,
    /// Application is shutting down
    Quitting,
}

/// Main TUI application state.
#[derive(Debug)]
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Most recent report
    pub report: StatusReport,
    /// Poller lifecycle state at the last redraw
    pub poller_state: PollerState,
    /// API endpoint shown in the header
    pub api_url: String,
    /// First visible row of the representatives table
    pub rep_offset: usize,
}

impl App {
    /// Page size used by PageUp/PageDown in the representatives table.
    pub const PAGE: usize = 10;

    /// Create the app with an initial report.
    pub fn new(report: StatusReport, api_url: impl Into<String>) -> Self {
        Self {
            state: AppState::Running,
            report,
            poller_state: PollerState::Fetching,
            api_url: api_url.into(),
            rep_offset: 0,
        }
    }

    /// Replace the report, keeping the scroll position in range.
    pub fn update_report(&mut self, report: StatusReport) {
        self.report = report;
        self.clamp_offset();
    }

    /// Check if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.state == AppState::Quitting
    }

    /// Signal the app to quit.
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(Self::PAGE),
            KeyCode::PageDown => self.scroll_down(Self::PAGE),
            KeyCode::Home => self.rep_offset = 0,
            _ => {}
        }
    }

    fn scroll_up(&mut self, rows: usize) {
        self.rep_offset = self.rep_offset.saturating_sub(rows);
    }

    fn scroll_down(&mut self, rows: usize) {
        self.rep_offset = self.rep_offset.saturating_add(rows);
        self.clamp_offset();
    }

    fn clamp_offset(&mut self) {
        let max = self.report.representatives.len().saturating_sub(1);
        self.rep_offset = self.rep_offset.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricMath, RepresentativeEntry};
    use crate::types::{NetworkData, NetworkSnapshot};

    fn report_with_reps(count: usize) -> StatusReport {
        let mut report = StatusReport::compose(
            &MetricMath::with_params(1000, 0),
            "TST",
            &NetworkData::default(),
            &NetworkSnapshot::default(),
        );
        report.representatives = (0..count)
            .map(|i| RepresentativeEntry {
                address: format!("rep-{i}"),
                weight: i as f64,
            })
            .collect();
        report
    }

    #[test]
    fn test_quit_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = App::new(report_with_reps(0), "http://localhost");
            assert!(!app.should_quit());
            app.handle_key(code);
            assert!(app.should_quit());
        }
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = App::new(report_with_reps(5), "http://localhost");
        app.handle_key(KeyCode::PageDown);
        assert_eq!(app.rep_offset, 4);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.rep_offset, 3);
        app.handle_key(KeyCode::PageUp);
        assert_eq!(app.rep_offset, 0);

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        app.update_report(report_with_reps(1));
        assert_eq!(app.rep_offset, 0);
    }
}
