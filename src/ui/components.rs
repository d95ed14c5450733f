//! Dashboard widgets: stage list, fact counts, progress gauge and activity log

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;
use std::collections::{BTreeMap, VecDeque};

use super::{Phase, Progress};
use crate::warehouse::FactKind;

const STAGES: [Phase; 5] = [
    Phase::Loading,
    Phase::Transforming,
    Phase::Analyzing,
    Phase::Checking,
    Phase::Writing,
];

const MAX_LOG_ENTRIES: usize = 200;

fn panel(title: String, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color))
}

/// Checklist of pipeline stages with the current one highlighted
pub struct StagePanel {
    phase: Phase,
    info: String,
}

impl StagePanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Loading,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = STAGES
            .iter()
            .map(|&stage| {
                let (mark, style) = if stage < self.phase {
                    ("x", Style::default().fg(Color::Green))
                } else if stage == self.phase {
                    (">", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                } else {
                    (" ", Style::default().fg(Color::DarkGray))
                };
                Line::from(vec![
                    Span::styled(format!(" [{}] ", mark), style),
                    Span::styled(stage.to_string(), style),
                ])
            })
            .collect();
        lines.push(Line::from(Span::styled(
            format!(" {}", self.info),
            Style::default().fg(Color::Gray),
        )));

        let title = if self.phase == Phase::Complete {
            " Dice Game Warehouse: done "
        } else {
            " Dice Game Warehouse "
        };
        frame.render_widget(
            Paragraph::new(lines).block(panel(title.to_string(), Color::Blue)),
            area,
        );
    }
}

/// Produced and excluded rows per fact table, plus the quality score once known
#[derive(Default)]
pub struct FactPanel {
    counts: BTreeMap<FactKind, (usize, usize)>,
    score: Option<(f64, bool)>,
}

impl FactPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_counts(&mut self, kind: FactKind, produced: usize, excluded: usize) {
        self.counts.insert(kind, (produced, excluded));
    }

    pub fn set_score(&mut self, score: f64, passed: bool) {
        self.score = Some((score, passed));
    }

    fn title(&self) -> String {
        match self.score {
            Some((score, passed)) => format!(
                " Facts, quality {:.1} {} ",
                score,
                if passed { "passed" } else { "failed" }
            ),
            None => " Facts ".to_string(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let border = match self.score {
            Some((_, true)) => Color::Green,
            Some((_, false)) => Color::Red,
            None => Color::Blue,
        };

        let rows = FactKind::ALL.iter().map(|kind| {
            let (produced, excluded) = self.counts.get(kind).copied().unwrap_or_default();
            let excluded_style = if excluded > 0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(kind.table_name()),
                Cell::from(produced.to_string()),
                Cell::from(excluded.to_string()).style(excluded_style),
            ])
        });

        let table = Table::new(
            rows,
            [Constraint::Min(18), Constraint::Length(8), Constraint::Length(9)],
        )
        .header(
            Row::new(vec!["table", "rows", "excluded"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(panel(self.title(), border));

        frame.render_widget(table, area);
    }
}

pub fn render_progress(frame: &mut Frame, area: Rect, progress: Option<&Progress>) {
    let block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .border_style(Style::default().fg(Color::Blue));

    let Some(progress) = progress else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .ratio(progress.ratio().min(1.0))
        .label(format!("{} ({}/{})", progress.label, progress.current, progress.total));
    frame.render_widget(gauge, area);
}

fn entry_style(entry: &str) -> Style {
    if entry.starts_with("CRITICAL") {
        Style::default().fg(Color::Red)
    } else if entry.starts_with("WARNING") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Recent pipeline messages; findings and exclusion warnings are counted
#[derive(Default)]
pub struct ActivityLog {
    entries: VecDeque<String>,
    alerts: usize,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>) {
        let message = message.into();
        if message.starts_with("CRITICAL") || message.starts_with("WARNING") {
            self.alerts += 1;
        }
        self.entries.push_back(message);
        if self.entries.len() > MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
    }

    fn title(&self) -> String {
        match self.alerts {
            0 => " Activity ".to_string(),
            n => format!(" Activity, {} alerts ", n),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .skip(skip)
            .map(|entry| ListItem::new(Span::styled(format!(" {}", entry), entry_style(entry))))
            .collect();

        frame.render_widget(List::new(items).block(panel(self.title(), Color::Blue)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_counts_alerts_and_drops_oldest() {
        let mut log = ActivityLog::new();
        log.add("WARNING play_session_fact: 1 rows excluded, unresolved user_id");
        for i in 0..MAX_LOG_ENTRIES {
            log.add(format!("line {}", i));
        }

        assert_eq!(log.entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(log.entries.front().map(String::as_str), Some("line 0"));
        assert_eq!(log.title(), " Activity, 1 alerts ");
    }

    #[test]
    fn test_fact_panel_title_shows_score() {
        let mut facts = FactPanel::new();
        assert_eq!(facts.title(), " Facts ");

        facts.set_counts(FactKind::PlaySession, 7, 1);
        facts.set_score(95.0, true);
        assert_eq!(facts.title(), " Facts, quality 95.0 passed ");
        assert_eq!(facts.counts.get(&FactKind::PlaySession), Some(&(7, 1)));
    }
}
