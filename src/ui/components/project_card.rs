use chrono::{Local, TimeZone};
use serde::Serialize;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::format::{
    format_date_in, format_money, progress_label, progress_tone, status_label, status_tone, Tone,
};
use crate::models::ProjectViewModel;

pub const DEADLINE_LABEL: &str = "Срок сдачи:";
pub const BUDGET_LABEL: &str = "Бюджет:";
pub const DAYS_LABEL: &str = "Дней строительства:";
pub const PROGRESS_LABEL: &str = "Прогресс";

/// Rows a rendered card occupies, borders included.
pub const CARD_HEIGHT: u16 = 9;

/// Display fields of one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCard {
    pub client_name: String,
    pub status_label: &'static str,
    pub status_tone: Tone,
    pub status_class: String,
    pub progress: f64,
    pub progress_label: String,
    pub progress_tone: Tone,
    pub progress_class: String,
    pub deadline: String,
    pub budget: String,
    pub construction_days: String,
}

impl ProjectCard {
    /// Card with the deadline shown in the local time zone
    pub fn from_view_model(project: &ProjectViewModel) -> Self {
        Self::in_zone(project, &Local)
    }

    /// Card with the deadline shown in `tz`, the zone `project` was assembled in.
    pub fn in_zone<Tz: TimeZone>(project: &ProjectViewModel, tz: &Tz) -> Self {
        let status_tone = status_tone(&project.status);
        let progress_tone = progress_tone(project.progress);
        Self {
            client_name: project.client_name.clone(),
            status_label: status_label(&project.status),
            status_tone,
            status_class: status_tone.badge_class(),
            progress: project.progress,
            progress_label: progress_label(project.progress),
            progress_tone,
            progress_class: progress_tone.bar_class(),
            deadline: format_date_in(&project.deadline, tz),
            budget: format_money(project.budget),
            construction_days: project.construction_days.to_string(),
        }
    }

    pub fn details(&self) -> [(&'static str, &str); 3] {
        [
            (DEADLINE_LABEL, self.deadline.as_str()),
            (BUDGET_LABEL, self.budget.as_str()),
            (DAYS_LABEL, self.construction_days.as_str()),
        ]
    }

    /// Plain-text rendering used outside the terminal UI
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{} [{}]\n{} {}\n",
            self.client_name, self.status_label, PROGRESS_LABEL, self.progress_label
        );
        for (label, value) in self.details() {
            text.push_str(&format!("{} {}\n", label, value));
        }
        text
    }
}

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Emerald => Color::Green,
        Tone::Amber => Color::Yellow,
        Tone::Blue => Color::Blue,
        Tone::Gray => Color::Gray,
        Tone::Red => Color::Red,
    }
}

pub fn render_project_card<B: Backend>(frame: &mut Frame<B>, area: Rect, card: &ProjectCard) {
    let block = Block::default()
        .title(Span::styled(
            card.client_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ].as_ref())
        .split(inner);

    let status = Paragraph::new(Span::styled(
        format!(" {} ", card.status_label),
        Style::default()
            .fg(Color::Black)
            .bg(tone_color(card.status_tone)),
    ));
    frame.render_widget(status, rows[0]);

    let heading = Paragraph::new(Spans::from(vec![
        Span::raw(PROGRESS_LABEL),
        Span::raw(" "),
        Span::styled(
            card.progress_label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(heading, rows[1]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(tone_color(card.progress_tone)).bg(Color::DarkGray))
        .ratio((card.progress / 100.0).clamp(0.0, 1.0))
        .label("");
    frame.render_widget(gauge, rows[2]);

    let details: Vec<Spans> = card
        .details()
        .iter()
        .map(|(label, value)| {
            Spans::from(vec![
                Span::styled(*label, Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::styled(value.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(details), rows[3]);
}
