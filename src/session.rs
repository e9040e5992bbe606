use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::kitty::{SessionStatus, WindowSnapshot};

/// A kitty window that is running a recognised AI tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// kitty window id, stable across polls
    pub window_id: u32,
    /// kitty tab id, used to group sibling windows
    pub tab_id: u32,
    /// Window title, tab title or cwd, whichever is set first
    pub title: String,
    pub cwd: String,
    /// Lower-cased tool name (one of the configured prefixes)
    pub ai: String,
    pub status: SessionStatus,
    /// Most recent non-empty output lines, oldest first
    pub lines: Vec<String>,
}

impl Session {
    pub fn new(window: &WindowSnapshot, ai: String, status: SessionStatus, lines: Vec<String>) -> Self {
        Self {
            window_id: window.id,
            tab_id: window.tab_id,
            title: window.display_title().to_string(),
            cwd: window.cwd.clone(),
            ai,
            status,
            lines,
        }
    }

    /// Name shown in the session list. Windows that share a tab get their
    /// cwd basename appended so they can be told apart.
    pub fn label(&self, tab_shared: bool) -> String {
        let mut name = if self.title.is_empty() {
            format!("tab-{}", self.tab_id)
        } else {
            self.title.clone()
        };

        if tab_shared {
            if let Some(base) = Path::new(&self.cwd).file_name() {
                name.push('/');
                name.push_str(&base.to_string_lossy());
            }
        }
        name
    }

    /// Two-letter code for the tool
    pub fn short_ai(&self) -> String {
        match self.ai.as_str() {
            "claude" => "CL".to_string(),
            "codex" => "CO".to_string(),
            "gemini" => "GE".to_string(),
            other => other.chars().take(2).collect::<String>().to_uppercase(),
        }
    }
}

/// The sessions found by one poll, kept in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRepository {
    sessions: Vec<Session>,
}

impl SessionRepository {
    /// Build a repository, ordering by tool name then title. Ties keep the
    /// order in which the windows were discovered.
    pub fn new(mut sessions: Vec<Session>) -> Self {
        sessions.sort_by(|a, b| a.ai.cmp(&b.ai).then_with(|| a.title.cmp(&b.title)));
        Self { sessions }
    }

    pub fn all(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions with the given status, in order. `None` returns everything.
    pub fn filtered(&self, filter: Option<SessionStatus>) -> Vec<&Session> {
        filter_sessions(self.sessions.iter(), filter)
    }

    /// Statuses that at least one session currently has, in fixed order
    pub fn available_statuses(&self) -> Vec<SessionStatus> {
        SessionStatus::ALL
            .into_iter()
            .filter(|status| self.sessions.iter().any(|s| s.status == *status))
            .collect()
    }

    pub fn count(&self, status: SessionStatus) -> usize {
        self.sessions.iter().filter(|s| s.status == status).count()
    }

    /// Number of detected sessions per tab id
    pub fn tab_counts(&self) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for session in &self.sessions {
            *counts.entry(session.tab_id).or_insert(0) += 1;
        }
        counts
    }
}

/// Keep only sessions matching `filter`, preserving order
pub fn filter_sessions<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    filter: Option<SessionStatus>,
) -> Vec<&'a Session> {
    sessions
        .into_iter()
        .filter(|s| filter.map_or(true, |status| s.status == status))
        .collect()
}
