use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tokio::sync::watch;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::feed::{filter_by_name, FeedState};
use crate::models::ProjectViewModel;
use crate::ui::components::project_card::{render_project_card, ProjectCard, CARD_HEIGHT};
use crate::ui::startup::{render_error, render_loading};

const TITLE: &str = "Проекты";
const SEARCH_PLACEHOLDER: &str = "Поиск проектов...";
const EMPTY_TITLE: &str = "Нет проектов";
const EMPTY_SEARCH_HINT: &str = "По вашему запросу ничего не найдено";
const EMPTY_HINT: &str = "Добавьте новый проект через страницу клиентов";
const GRID_COLUMNS: usize = 3;

// Represents the state of the projects page
pub struct ProjectsState {
    feed: watch::Receiver<FeedState>,
    query: String,
    search_focused: bool,
    scroll: usize,
}

impl ProjectsState {
    pub fn new(feed: watch::Receiver<FeedState>) -> Self {
        Self {
            feed,
            query: String::new(),
            search_focused: false,
            scroll: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.scroll = 0;
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.scroll = 0;
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        self.scroll += 1;
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Current feed contents. Cloned so the feed is never held up by a draw.
    fn current(&mut self) -> FeedState {
        self.feed.borrow_and_update().clone()
    }
}

pub enum ProjectAction {
    Quit,
}

/// Number of grid rows needed for `count` cards.
fn grid_rows(count: usize) -> usize {
    count.div_ceil(GRID_COLUMNS)
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let projects = match state.current() {
        FeedState::Failed(message) => {
            render_error(frame, &message);
            return;
        }
        FeedState::Loading => None,
        FeedState::Ready(projects) => Some(projects),
    };

    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ].as_ref())
        .split(size);

    let title = Paragraph::new(Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, chunks[0]);

    render_search(frame, chunks[1], state);

    match projects {
        None => render_loading(frame, chunks[2]),
        Some(projects) => {
            let visible = filter_by_name(&projects, &state.query);
            if visible.is_empty() {
                render_empty(frame, chunks[2], !state.query.is_empty());
            } else {
                render_grid(frame, chunks[2], &visible, state);
            }
        }
    }

    let help = if state.search_focused {
        "<Enter>/<Esc> Done".to_string()
    } else {
        "</> Search | <Up>/<Down> Scroll | <Esc> Clear search | <Q> Quit".to_string()
    };
    let buttons = Paragraph::new(help)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[3]);
}

fn render_search<B: Backend>(frame: &mut Frame<B>, area: Rect, state: &ProjectsState) {
    let query = state.query();
    let text = if query.is_empty() && !state.search_focused {
        Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(query.to_string())
    };

    let border_style = if state.search_focused {
        Style::default().fg(Color::Blue)
    } else {
        Style::default()
    };

    let search = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(search, area);

    if state.search_focused {
        let cursor_x = area.x + 1 + query.chars().count() as u16;
        frame.set_cursor(cursor_x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

fn render_empty<B: Backend>(frame: &mut Frame<B>, area: Rect, searching: bool) {
    let hint = if searching { EMPTY_SEARCH_HINT } else { EMPTY_HINT };
    let empty = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(Span::styled(EMPTY_TITLE, Style::default().add_modifier(Modifier::BOLD))),
        Spans::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(empty, area);
}

fn render_grid<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    projects: &[&ProjectViewModel],
    state: &mut ProjectsState,
) {
    let total_rows = grid_rows(projects.len());
    let fitting_rows = ((area.height / CARD_HEIGHT) as usize).max(1);
    state.scroll = state.scroll.min(total_rows.saturating_sub(fitting_rows));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            std::iter::repeat(Constraint::Length(CARD_HEIGHT))
                .take(fitting_rows)
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(area);

    let page = projects
        .chunks(GRID_COLUMNS)
        .skip(state.scroll)
        .take(fitting_rows);
    for (row_area, row) in rows.iter().zip(page) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ].as_ref())
            .split(*row_area);

        for (cell, project) in columns.iter().zip(row) {
            render_project_card(frame, *cell, &ProjectCard::from_view_model(project));
        }
    }
}

/// Handle one input event, waiting at most `timeout` for it so feed
/// updates keep being drawn.
pub fn handle_input(state: &mut ProjectsState, timeout: Duration) -> Result<Option<ProjectAction>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }

    if let Event::Key(key) = event::read()? {
        if state.search_focused {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => state.search_focused = false,
                KeyCode::Backspace => state.pop_query(),
                KeyCode::Char(c) => state.push_query(c),
                _ => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Some(ProjectAction::Quit)),
            KeyCode::Char('/') => state.search_focused = true,
            KeyCode::Esc => state.clear_query(),
            KeyCode::Down => state.scroll_down(),
            KeyCode::Up => state.scroll_up(),
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rows_round_up() {
        assert_eq!(grid_rows(0), 0);
        assert_eq!(grid_rows(1), 1);
        assert_eq!(grid_rows(3), 1);
        assert_eq!(grid_rows(4), 2);
    }

    #[test]
    fn editing_the_query_resets_scroll() {
        let (_sender, receiver) = watch::channel(FeedState::Loading);
        let mut state = ProjectsState::new(receiver);
        state.scroll_down();
        state.scroll_down();
        state.push_query('к');
        assert_eq!(state.scroll, 0);
        assert_eq!(state.query(), "к");

        state.scroll_down();
        state.pop_query();
        assert_eq!(state.scroll, 0);
        assert_eq!(state.query(), "");

        state.scroll_up();
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn page_reads_the_latest_feed_state() {
        let (sender, receiver) = watch::channel(FeedState::Loading);
        let mut state = ProjectsState::new(receiver);
        assert_eq!(state.current(), FeedState::Loading);

        sender.send_replace(FeedState::Ready(Vec::new()));
        sender.send_replace(FeedState::Failed("offline".to_string()));
        assert_eq!(state.current(), FeedState::Failed("offline".to_string()));
    }
}
