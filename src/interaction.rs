use crate::actions::Command;
use crate::kitty::SessionStatus;
use crate::session::{Session, SessionRepository};

/// Which list receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Sessions,
    StatusFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browsing,
    /// Editing a new title for `window_id`
    Renaming { window_id: u32, buffer: String },
}

/// Keyboard intents understood by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    MoveUp,
    MoveDown,
    Confirm,
    StartRename,
    SwitchPanel,
    ClearFilter,
    Cancel,
    DeleteChar,
    InsertChar(char),
}

/// Selection, filter and rename state for the session panels.
///
/// Transitions are synchronous and side-effect free: anything that has to
/// reach kitty is returned as a [`Command`] for the caller to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    panel: Panel,
    /// Index into the filtered session list
    selected: usize,
    /// Index into the available statuses
    status_selected: usize,
    filter: Option<SessionStatus>,
    mode: Mode,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status_selected(&self) -> usize {
        self.status_selected
    }

    pub fn filter(&self) -> Option<SessionStatus> {
        self.filter
    }

    pub fn is_renaming(&self) -> bool {
        matches!(self.mode, Mode::Renaming { .. })
    }

    /// Current contents of the rename prompt, if open
    pub fn rename_buffer(&self) -> Option<&str> {
        match &self.mode {
            Mode::Renaming { buffer, .. } => Some(buffer.as_str()),
            Mode::Browsing => None,
        }
    }

    /// Sessions visible under the active filter
    pub fn visible<'a>(&self, repo: &'a SessionRepository) -> Vec<&'a Session> {
        repo.filtered(self.filter)
    }

    pub fn selected_session<'a>(&self, repo: &'a SessionRepository) -> Option<&'a Session> {
        self.visible(repo).get(self.selected).copied()
    }

    /// Re-clamp indices after the session snapshot was replaced
    pub fn sync(&mut self, repo: &SessionRepository) {
        self.selected = clamp(self.selected, self.visible(repo).len());
        self.status_selected = clamp(self.status_selected, repo.available_statuses().len());
    }

    /// Apply one input, returning a command to run if the input calls for one
    pub fn handle(&mut self, input: Input, repo: &SessionRepository) -> Option<Command> {
        let command = match self.mode.clone() {
            Mode::Renaming { window_id, buffer } => self.handle_renaming(input, window_id, buffer),
            Mode::Browsing => match self.panel {
                Panel::Sessions => self.handle_sessions(input, repo),
                Panel::StatusFilter => self.handle_status_filter(input, repo),
            },
        };
        self.sync(repo);
        command
    }

    fn handle_sessions(&mut self, input: Input, repo: &SessionRepository) -> Option<Command> {
        let visible = self.visible(repo);
        match input {
            Input::MoveUp => self.selected = self.selected.saturating_sub(1),
            Input::MoveDown => {
                if self.selected + 1 < visible.len() {
                    self.selected += 1;
                }
            }
            Input::Confirm => {
                return visible
                    .get(self.selected)
                    .map(|s| Command::FocusWindow(s.window_id));
            }
            Input::StartRename => {
                if let Some(session) = visible.get(self.selected) {
                    self.mode = Mode::Renaming {
                        window_id: session.window_id,
                        buffer: session.title.clone(),
                    };
                }
            }
            Input::SwitchPanel => self.panel = Panel::StatusFilter,
            Input::ClearFilter => self.clear_filter(),
            _ => {}
        }
        None
    }

    fn handle_status_filter(&mut self, input: Input, repo: &SessionRepository) -> Option<Command> {
        let statuses = repo.available_statuses();
        match input {
            Input::MoveUp if !statuses.is_empty() => {
                self.status_selected = match self.status_selected {
                    0 => statuses.len() - 1,
                    i => i - 1,
                };
            }
            Input::MoveDown if !statuses.is_empty() => {
                self.status_selected = (self.status_selected + 1) % statuses.len();
            }
            Input::Confirm => {
                if let Some(&status) = statuses.get(self.status_selected) {
                    self.filter = if self.filter == Some(status) {
                        None
                    } else {
                        Some(status)
                    };
                    self.selected = 0;
                    self.panel = Panel::Sessions;
                }
            }
            Input::SwitchPanel => self.panel = Panel::Sessions,
            Input::ClearFilter => self.clear_filter(),
            _ => {}
        }
        None
    }

    fn handle_renaming(&mut self, input: Input, window_id: u32, buffer: String) -> Option<Command> {
        match input {
            Input::Confirm => {
                self.mode = Mode::Browsing;
                Some(Command::RenameWindow {
                    window_id,
                    title: buffer,
                })
            }
            Input::Cancel => {
                self.mode = Mode::Browsing;
                None
            }
            Input::DeleteChar => {
                let mut chars = buffer.chars();
                chars.next_back();
                self.mode = Mode::Renaming {
                    window_id,
                    buffer: chars.as_str().to_string(),
                };
                None
            }
            Input::InsertChar(c) if !c.is_control() => {
                self.mode = Mode::Renaming {
                    window_id,
                    buffer: format!("{buffer}{c}"),
                };
                None
            }
            _ => None,
        }
    }

    fn clear_filter(&mut self) {
        self.filter = None;
        self.panel = Panel::Sessions;
    }
}

fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::session;
    use crate::kitty::SessionStatus::*;

    fn repo() -> SessionRepository {
        SessionRepository::new(vec![
            session(1, "claude", "api", Running),
            session(2, "claude", "web", Idle),
            session(3, "codex", "cli", Running),
            session(4, "gemini", "docs", Done),
        ])
    }

    fn run(state: &mut InteractionState, repo: &SessionRepository, inputs: &[Input]) -> Vec<Command> {
        inputs
            .iter()
            .filter_map(|input| state.handle(*input, repo))
            .collect()
    }

    #[test]
    fn test_session_navigation_clamps() {
        let repo = repo();
        let mut state = InteractionState::new();

        run(&mut state, &repo, &[Input::MoveUp]);
        assert_eq!(state.selected(), 0);

        run(&mut state, &repo, &[Input::MoveDown; 10]);
        assert_eq!(state.selected(), 3);

        run(&mut state, &repo, &[Input::MoveUp]);
        assert_eq!(state.selected(), 2);
    }

    #[test]
    fn test_confirm_focuses_selected_window() {
        let repo = repo();
        let mut state = InteractionState::new();
        let commands = run(&mut state, &repo, &[Input::MoveDown, Input::Confirm]);
        assert_eq!(commands, vec![Command::FocusWindow(2)]);
    }

    #[test]
    fn test_empty_list_is_inert() {
        let repo = SessionRepository::default();
        let mut state = InteractionState::new();
        let commands = run(
            &mut state,
            &repo,
            &[Input::MoveDown, Input::Confirm, Input::StartRename, Input::MoveUp],
        );
        assert!(commands.is_empty());
        assert!(!state.is_renaming());
        assert_eq!(state.selected(), 0);
        assert_eq!(state.selected_session(&repo), None);
    }

    #[test]
    fn test_status_panel_wraps() {
        let repo = repo();
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::SwitchPanel]);
        assert_eq!(state.panel(), Panel::StatusFilter);

        // RUNNING, IDLE, DONE are present
        run(&mut state, &repo, &[Input::MoveUp]);
        assert_eq!(state.status_selected(), 2);
        run(&mut state, &repo, &[Input::MoveDown]);
        assert_eq!(state.status_selected(), 0);
        run(&mut state, &repo, &[Input::MoveDown, Input::MoveDown]);
        assert_eq!(state.status_selected(), 2);

        // Session selection is untouched while the status panel has focus
        assert_eq!(state.selected(), 0);
    }

    #[test]
    fn test_filter_toggle() {
        let repo = repo();
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::MoveDown, Input::MoveDown]);
        assert_eq!(state.selected(), 2);

        run(&mut state, &repo, &[Input::SwitchPanel, Input::Confirm]);
        assert_eq!(state.filter(), Some(Running));
        assert_eq!(state.panel(), Panel::Sessions);
        assert_eq!(state.selected(), 0);
        let ids: Vec<u32> = state.visible(&repo).iter().map(|s| s.window_id).collect();
        assert_eq!(ids, vec![1, 3]);

        run(&mut state, &repo, &[Input::MoveDown]);
        assert_eq!(state.selected(), 1);

        // Same status again clears it
        run(&mut state, &repo, &[Input::SwitchPanel, Input::Confirm]);
        assert_eq!(state.filter(), None);
        assert_eq!(state.selected(), 0);
        assert_eq!(state.visible(&repo).len(), 4);
    }

    #[test]
    fn test_filter_replace_and_clear() {
        let repo = repo();
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::SwitchPanel, Input::Confirm]);
        run(&mut state, &repo, &[Input::SwitchPanel, Input::MoveDown, Input::Confirm]);
        assert_eq!(state.filter(), Some(Idle));
        assert_eq!(state.selected_session(&repo).map(|s| s.window_id), Some(2));

        run(&mut state, &repo, &[Input::SwitchPanel, Input::ClearFilter]);
        assert_eq!(state.filter(), None);
        assert_eq!(state.panel(), Panel::Sessions);
    }

    #[test]
    fn test_rename_flow() {
        let repo = repo();
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::MoveDown, Input::StartRename]);
        assert_eq!(state.rename_buffer(), Some("web"));

        // Navigation keys are ignored while renaming
        let commands = run(
            &mut state,
            &repo,
            &[
                Input::MoveDown,
                Input::SwitchPanel,
                Input::DeleteChar,
                Input::InsertChar('b'),
                Input::InsertChar(' '),
                Input::InsertChar('日'),
                Input::InsertChar('本'),
                Input::InsertChar('\u{7}'),
            ],
        );
        assert!(commands.is_empty());
        assert_eq!(state.rename_buffer(), Some("web 日本"));

        run(&mut state, &repo, &[Input::DeleteChar]);
        assert_eq!(state.rename_buffer(), Some("web 日"));

        let commands = run(&mut state, &repo, &[Input::Confirm]);
        assert_eq!(
            commands,
            vec![Command::RenameWindow {
                window_id: 2,
                title: "web 日".to_string()
            }]
        );
        assert!(!state.is_renaming());
        assert_eq!(state.panel(), Panel::Sessions);
    }

    #[test]
    fn test_rename_targets_window_chosen_at_start() {
        let repo = repo();
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::StartRename]);

        // The list reorders underneath the prompt
        let reordered = SessionRepository::new(vec![
            session(9, "aider", "first", Idle),
            session(1, "claude", "api", Running),
        ]);
        state.sync(&reordered);
        let commands = run(&mut state, &reordered, &[Input::Confirm]);
        assert_eq!(
            commands,
            vec![Command::RenameWindow {
                window_id: 1,
                title: "api".to_string()
            }]
        );
    }

    #[test]
    fn test_rename_cancel_and_empty_backspace() {
        let repo = SessionRepository::new(vec![session(5, "codex", "", Idle)]);
        let mut state = InteractionState::new();
        run(&mut state, &repo, &[Input::StartRename, Input::DeleteChar]);
        assert_eq!(state.rename_buffer(), Some(""));

        let commands = run(&mut state, &repo, &[Input::InsertChar('x'), Input::Cancel]);
        assert!(commands.is_empty());
        assert!(!state.is_renaming());
        assert_eq!(state.rename_buffer(), None);
    }

    #[test]
    fn test_selection_clamped_when_snapshot_shrinks() {
        let mut state = InteractionState::new();
        let repo = repo();
        run(&mut state, &repo, &[Input::MoveDown; 3]);
        assert_eq!(state.selected(), 3);

        let smaller = SessionRepository::new(vec![session(1, "claude", "api", Running)]);
        state.sync(&smaller);
        assert_eq!(state.selected(), 0);

        state.sync(&SessionRepository::default());
        assert_eq!(state.selected(), 0);
        assert_eq!(state.status_selected(), 0);
    }

    #[test]
    fn test_selection_invariant_under_mixed_inputs() {
        let repo = repo();
        let mut state = InteractionState::new();
        let script = [
            Input::MoveDown,
            Input::SwitchPanel,
            Input::MoveDown,
            Input::MoveDown,
            Input::Confirm,
            Input::MoveDown,
            Input::MoveDown,
            Input::SwitchPanel,
            Input::MoveUp,
            Input::Confirm,
            Input::MoveDown,
            Input::ClearFilter,
            Input::MoveDown,
        ];
        for input in script {
            state.handle(input, &repo);
            let len = state.visible(&repo).len();
            assert!(state.selected() < len.max(1));
        }
    }
}
