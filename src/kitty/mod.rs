mod client;
mod heuristics;
mod identify;

pub use client::KittyClient;
pub use heuristics::{classify, normalize_lines, Fingerprint, SessionStatus};
pub use identify::identify;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::KittyError;

/// A foreground process running inside a kitty window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    #[serde(default)]
    pub pid: u32,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub cmdline: Vec<String>,
}

/// One kitty window as seen on a single poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// kitty window id (never 0 for a real window)
    pub id: u32,
    pub tab_id: u32,
    pub title: String,
    pub tab_title: String,
    pub cwd: String,
    pub processes: Vec<ProcessRecord>,
}

impl WindowSnapshot {
    /// Window title, else tab title, else working directory
    pub fn display_title(&self) -> &str {
        [&self.title, &self.tab_title, &self.cwd]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// The remote-control operations the monitor needs from the terminal
pub trait WindowSource: Send + Sync {
    /// List every window across all OS windows and tabs
    fn list_windows(&self) -> impl Future<Output = Result<Vec<WindowSnapshot>, KittyError>> + Send;

    /// Fetch the visible text of a window
    fn get_text(&self, window_id: u32) -> impl Future<Output = Result<String, KittyError>> + Send;

    /// Bring a window to the front
    fn focus_window(&self, window_id: u32) -> impl Future<Output = Result<(), KittyError>> + Send;

    /// Set a window's title
    fn rename_window(
        &self,
        window_id: u32,
        title: &str,
    ) -> impl Future<Output = Result<(), KittyError>> + Send;
}
