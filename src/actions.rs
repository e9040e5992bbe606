use crossterm::event::KeyEvent;

use crate::poller::PollOutcome;

/// Messages delivered to the main event loop
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// A poll finished and produced a fresh snapshot
    SessionsUpdated(PollOutcome),
    /// A poll failed; the previous snapshot stays on screen
    PollFailed(String),
    /// A focus or rename call returned
    CommandFinished {
        command: Command,
        result: Result<(), String>,
    },
}

/// Side effects requested by the interaction state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bring a kitty window to the front
    FocusWindow(u32),
    /// Change a kitty window's title
    RenameWindow { window_id: u32, title: String },
}

impl Command {
    pub fn describe(&self) -> String {
        match self {
            Command::FocusWindow(id) => format!("focus window {id}"),
            Command::RenameWindow { window_id, title } => {
                format!("rename window {window_id} to '{title}'")
            }
        }
    }
}
