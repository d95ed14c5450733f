//! Progress reporting for the pipeline
//!
//! The pipeline talks to a [`Ui`] rather than printing directly:
//! - [`TracingUi`] forwards everything to `tracing` (default)
//! - [`SilentUi`] discards it (tests, embedding)
//! - [`UiApp`] draws a ratatui dashboard with stages, fact counts, progress and activity log

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, info};

use crate::warehouse::FactKind;
use components::{render_progress, ActivityLog, FactPanel, StagePanel};

/// Pipeline phases, in the order a full run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Loading,
    Transforming,
    Analyzing,
    Checking,
    Writing,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Loading => write!(f, "Loading source CSV files"),
            Phase::Transforming => write!(f, "Building star schema"),
            Phase::Analyzing => write!(f, "Computing analytics"),
            Phase::Checking => write!(f, "Running quality checks"),
            Phase::Writing => write!(f, "Writing outputs"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Reporting collaborator injected into every pipeline stage
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);

    /// Rows produced and excluded for one fact table
    fn set_fact_counts(&mut self, _kind: FactKind, _produced: usize, _excluded: usize) {}

    fn set_score(&mut self, _score: f64, _passed: bool) {}
}

/// Terminal dashboard implementation
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    stages: StagePanel,
    facts: FactPanel,
    progress: Option<Progress>,
    log: ActivityLog,
}

impl UiApp {
    /// Create a new UI application and enter the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            stages: StagePanel::new(),
            facts: FactPanel::new(),
            progress: None,
            log: ActivityLog::new(),
        })
    }

    fn draw(&mut self) -> Result<()> {
        let stages = &self.stages;
        let facts = &self.facts;
        let progress = self.progress.as_ref();
        let log = &self.log;

        self.terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(8), // stages (5 + info line) beside fact counts
                    Constraint::Length(3),
                    Constraint::Min(5),
                ])
                .split(frame.area());
            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(rows[0]);

            stages.render(frame, top[0]);
            facts.render(frame, top[1]);
            render_progress(frame, rows[1], progress);
            log.render(frame, rows[2]);
        })?;

        Ok(())
    }

    /// Show the summary, wait for a keypress and restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.clear_progress();
        for line in summary.lines() {
            self.log(line);
        }
        self.log("Press any key to exit...");
        self.draw()?;

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(_) = event::read()? {
                    break;
                }
            }
        }

        self.restore()
    }

    /// Restore terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.stages.set_phase(phase);
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.stages.set_info(info);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress = Some(Progress::new(current, total, label));
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress = None;
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(message);
        self.draw().ok();
    }

    fn set_fact_counts(&mut self, kind: FactKind, produced: usize, excluded: usize) {
        self.facts.set_counts(kind, produced, excluded);
        self.draw().ok();
    }

    fn set_score(&mut self, score: f64, passed: bool) {
        self.facts.set_score(score, passed);
        self.draw().ok();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        // Best effort cleanup
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Forwards pipeline events to `tracing`
#[derive(Default)]
pub struct TracingUi;

impl TracingUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for TracingUi {
    fn set_phase(&mut self, phase: Phase) {
        info!("{}", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        debug!(current, total, "{}", label.into());
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        info!("{}", message.into());
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

/// Records everything it is told; used by tests to assert on reporting
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub phases: Vec<Phase>,
    pub messages: Vec<String>,
    pub fact_counts: Vec<(FactKind, usize, usize)>,
    pub score: Option<(f64, bool)>,
}

impl Ui for RecordingUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.messages.push(info.into());
    }

    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    fn set_fact_counts(&mut self, kind: FactKind, produced: usize, excluded: usize) {
        self.fact_counts.push((kind, produced, excluded));
    }

    fn set_score(&mut self, score: f64, passed: bool) {
        self.score = Some((score, passed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_ordered() {
        assert!(Phase::Loading < Phase::Writing);
        assert!(Phase::Writing < Phase::Complete);
    }

    #[test]
    fn test_progress_ratio() {
        assert_eq!(Progress::new(0, 0, "x").ratio(), 0.0);
        assert_eq!(Progress::new(3, 4, "x").ratio(), 0.75);
    }

    #[test]
    fn test_recording_ui_keeps_order() {
        let mut ui = RecordingUi::default();
        ui.set_phase(Phase::Loading);
        ui.log("first");
        ui.set_phase(Phase::Transforming);
        ui.log("second");

        assert_eq!(ui.phases, vec![Phase::Loading, Phase::Transforming]);
        assert_eq!(ui.messages, vec!["first", "second"]);
    }
}
