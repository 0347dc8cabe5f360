use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const LOADING_TEXT: &str = "Загрузка...";
const ERROR_PREFIX: &str = "Ошибка загрузки данных:";

pub fn error_message(message: &str) -> String {
    format!("{} {}", ERROR_PREFIX, message)
}

pub fn render_loading<B: Backend>(frame: &mut Frame<B>, area: Rect) {
    let loading = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(Span::styled(LOADING_TEXT, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(loading, area);
}

/// Full-screen loading indicator shown while the store is probed
pub fn render_startup<B: Backend>(frame: &mut Frame<B>) {
    let area = frame.size();
    render_loading(frame, area);
}

/// Full-screen error. Nothing else is drawn once the dashboard is in this state.
pub fn render_error<B: Backend>(frame: &mut Frame<B>, message: &str) {
    let popup_area = centered_rect(60, 30, frame.size());

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(Span::styled(
            error_message(message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Spans::from(""),
        Spans::from("<Q> Quit"),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().title("Error").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup, popup_area);
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Returns true once the user asks to leave the error screen.
pub fn handle_error_input(timeout: Duration) -> Result<bool> {
    if !event::poll(timeout)? {
        return Ok(false);
    }
    if let Event::Key(key) = event::read()? {
        return Ok(matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter));
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_carries_the_cause() {
        assert_eq!(
            error_message("document store is offline"),
            "Ошибка загрузки данных: document store is offline"
        );
    }

    #[test]
    fn centered_rect_stays_inside_the_frame() {
        let frame = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 30, frame);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 12);
        assert_eq!(popup.x, 20);
    }
}
