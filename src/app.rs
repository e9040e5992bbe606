use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::warn;

use crate::actions::{Action, Command};
use crate::interaction::{Input, InteractionState, Panel};
use crate::kitty::SessionStatus;
use crate::poller::FingerprintTable;
use crate::session::SessionRepository;

/// Max characters of a session label in the list
const LABEL_WIDTH: usize = 20;

/// Theme colors, lazydocker style
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub selected_bg: Color,
    pub running: Color,
    pub idle: Color,
    pub waiting: Color,
    pub done: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Indexed(255),
            accent: Color::Indexed(86),
            dim: Color::Indexed(240),
            selected_bg: Color::Indexed(30),
            running: Color::Indexed(78),
            idle: Color::Indexed(240),
            waiting: Color::Indexed(220),
            done: Color::Indexed(86),
            error: Color::Indexed(196),
        }
    }
}

impl Theme {
    fn status(&self, status: SessionStatus) -> Style {
        let color = match status {
            SessionStatus::Running => self.running,
            SessionStatus::Idle => self.idle,
            SessionStatus::Waiting => self.waiting,
            SessionStatus::Done => self.done,
        };
        Style::default().fg(color)
    }

    fn border(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.accent } else { self.dim })
    }
}

/// Main application state
pub struct App {
    /// Latest session snapshot
    pub sessions: SessionRepository,
    /// Fingerprints from the latest completed poll
    pub fingerprints: FingerprintTable,
    /// Selection, filter and rename state
    pub interaction: InteractionState,
    /// Error from the most recent poll, cleared by the next successful one
    pub poll_error: Option<String>,
    /// Transient message for the footer, cleared on the next key press
    pub status_message: Option<String>,
    /// When the last poll or command result arrived
    pub last_update: Option<DateTime<Local>>,
    /// Theme
    pub theme: Theme,
    /// Commands waiting to be dispatched by the event loop
    pub pending_commands: Vec<Command>,
}

impl App {
    pub fn new() -> Self {
        Self {
            sessions: SessionRepository::default(),
            fingerprints: FingerprintTable::new(),
            interaction: InteractionState::new(),
            poll_error: None,
            status_message: None,
            last_update: None,
            theme: Theme::default(),
            pending_commands: Vec::new(),
        }
    }

    /// Take pending commands (drains the queue)
    pub fn take_pending_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending_commands)
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => return Ok(self.handle_key(key)),
            Action::SessionsUpdated(outcome) => {
                self.sessions = outcome.sessions;
                self.fingerprints = outcome.fingerprints;
                self.interaction.sync(&self.sessions);
                self.poll_error = None;
                self.last_update = Some(Local::now());
            }
            Action::PollFailed(msg) => {
                self.poll_error = Some(format!("kitty: {msg}"));
                self.last_update = Some(Local::now());
            }
            Action::CommandFinished { command, result } => {
                if let Err(e) = result {
                    warn!(command = %command.describe(), error = %e, "command failed");
                    self.status_message = Some(format!("Failed to {}: {e}", command.describe()));
                }
                self.last_update = Some(Local::now());
            }
        }
        Ok(false)
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let input = if self.interaction.is_renaming() {
            match key.code {
                KeyCode::Enter => Input::Confirm,
                KeyCode::Esc => Input::Cancel,
                KeyCode::Backspace => Input::DeleteChar,
                KeyCode::Char(c) if KeyModifiers::SHIFT.contains(key.modifiers) => {
                    Input::InsertChar(c)
                }
                _ => return false,
            }
        } else {
            // Clear message on any key press
            self.status_message = None;

            match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return true;
                }
                KeyCode::Tab => Input::SwitchPanel,
                KeyCode::Esc => Input::ClearFilter,
                KeyCode::Enter => Input::Confirm,
                KeyCode::Char('r') => Input::StartRename,
                KeyCode::Char('k') | KeyCode::Up => Input::MoveUp,
                KeyCode::Char('j') | KeyCode::Down => Input::MoveDown,
                _ => return false,
            }
        };

        if let Some(command) = self.interaction.handle(input, &self.sessions) {
            self.pending_commands.push(command);
        }
        false
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Panels
                Constraint::Length(1), // Footer
            ])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Sessions
                Constraint::Length(7), // Status
            ])
            .split(columns[0]);

        self.render_sessions(frame, left[0]);
        self.render_status(frame, left[1]);
        self.render_output(frame, columns[1]);
        self.render_footer(frame, chunks[1]);
    }

    fn render_sessions(&self, frame: &mut Frame, area: Rect) {
        let focused = self.interaction.panel() == Panel::Sessions;
        let visible = self.interaction.visible(&self.sessions);
        let tab_counts = self.sessions.tab_counts();

        let items: Vec<ListItem> = if visible.is_empty() {
            let empty = if self.interaction.filter().is_some() {
                " (no matching sessions)"
            } else {
                " (no sessions)"
            };
            vec![ListItem::new(Span::styled(empty, Style::default().fg(self.theme.dim)))]
        } else {
            visible
                .iter()
                .map(|session| {
                    let shared = tab_counts.get(&session.tab_id).copied().unwrap_or(0) > 1;
                    let label = truncate(&session.label(shared), LABEL_WIDTH);
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!(" {label} ({}) ", session.short_ai()),
                            Style::default().fg(self.theme.fg),
                        ),
                        Span::styled(
                            format!("{:<7}", session.status),
                            self.theme.status(session.status),
                        ),
                    ]))
                })
                .collect()
        };

        let title = match self.interaction.filter() {
            Some(status) => format!(" Sessions [{status}] "),
            None => " Sessions ".to_string(),
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(title, title_style(&self.theme)))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(focused)),
            )
            .highlight_style(highlight_style(&self.theme));

        let mut state = ListState::default();
        if focused && !visible.is_empty() {
            state.select(Some(self.interaction.selected()));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let focused = self.interaction.panel() == Panel::StatusFilter;
        let statuses = self.sessions.available_statuses();

        let items: Vec<ListItem> = if statuses.is_empty() {
            vec![ListItem::new(Span::styled(
                " (no sessions)",
                Style::default().fg(self.theme.dim),
            ))]
        } else {
            statuses
                .iter()
                .map(|&status| {
                    let marker = if self.interaction.filter() == Some(status) {
                        "*"
                    } else {
                        " "
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(marker),
                        Span::styled(
                            format!("{status}: {}", self.sessions.count(status)),
                            self.theme.status(status),
                        ),
                    ]))
                })
                .collect()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(Span::styled(" Status ", title_style(&self.theme)))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(focused)),
            )
            .highlight_style(highlight_style(&self.theme));

        let mut state = ListState::default();
        if focused && !statuses.is_empty() {
            state.select(Some(self.interaction.status_selected()));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_output(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Output ", title_style(&self.theme)))
            .borders(Borders::ALL)
            .border_style(self.theme.border(false));

        let inner_height = area.height.saturating_sub(2).max(1) as usize;
        let inner_width = area.width.saturating_sub(3) as usize;

        let content: Vec<Line> = match self.interaction.selected_session(&self.sessions) {
            None => vec![dim_line(" (no output)", &self.theme)],
            Some(session) if session.lines.is_empty() => vec![dim_line(" (empty)", &self.theme)],
            Some(session) => {
                let start = session.lines.len().saturating_sub(inner_height);
                session.lines[start..]
                    .iter()
                    .map(|line| Line::from(format!(" {}", truncate(line, inner_width))))
                    .collect()
            }
        };

        frame.render_widget(Paragraph::new(content).block(block), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(self.theme.accent);
        let desc = Style::default().fg(self.theme.dim);

        if let Some(buffer) = self.interaction.rename_buffer() {
            let prompt = Line::from(vec![
                Span::styled("Rename: ", key),
                Span::raw(format!("{buffer}█")),
                Span::styled(" (enter: confirm, esc: cancel)", desc),
            ]);
            frame.render_widget(Paragraph::new(prompt), area);
            return;
        }

        let bindings: &[(&str, &str)] = match self.interaction.panel() {
            Panel::Sessions => &[
                ("↑↓", "nav"),
                ("enter", "focus"),
                ("r", "rename"),
                ("tab", "filter"),
                ("q", "quit"),
            ],
            Panel::StatusFilter => &[
                ("↑↓", "nav"),
                ("enter", "select"),
                ("esc", "back"),
                ("q", "quit"),
            ],
        };

        let mut spans = Vec::new();
        if let Some(msg) = self.status_message.as_ref().or(self.poll_error.as_ref()) {
            spans.push(Span::styled(
                format!("{msg}  "),
                Style::default().fg(self.theme.error),
            ));
        }
        for (k, d) in bindings {
            spans.push(Span::styled(*k, key));
            spans.push(Span::styled(format!(": {d}  "), desc));
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);

        frame.render_widget(Paragraph::new(Line::from(spans)), columns[0]);
        if let Some(updated) = self.last_update {
            frame.render_widget(
                Paragraph::new(Span::styled(updated.format("%H:%M:%S").to_string(), desc)),
                columns[1],
            );
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn title_style(theme: &Theme) -> Style {
    Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD)
}

fn highlight_style(theme: &Theme) -> Style {
    Style::default().bg(theme.selected_bg).fg(theme.fg)
}

fn dim_line<'a>(text: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(Span::styled(text, Style::default().fg(theme.dim)))
}

/// Shorten `s` to at most `max` characters, ending in `...` when cut
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}
