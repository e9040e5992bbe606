use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Number of trailing lines that make up a fingerprint
const FINGERPRINT_LINES: usize = 5;

/// Number of trailing lines scanned for textual markers
const LOOKBACK_LINES: usize = 20;

/// Coarse activity state of an AI session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Output is changing or the tool says it is working
    Running,
    /// Sitting at a prompt
    Idle,
    /// Asking the user for approval or confirmation
    Waiting,
    /// Reported that its task finished
    Done,
}

impl SessionStatus {
    /// Fixed display and filter order
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Running,
        SessionStatus::Idle,
        SessionStatus::Waiting,
        SessionStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "RUNNING",
            SessionStatus::Idle => "IDLE",
            SessionStatus::Waiting => "WAITING",
            SessionStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Snapshot of a window's most recent lines, compared across polls
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_lines(lines: &[String]) -> Self {
        let start = lines.len().saturating_sub(FINGERPRINT_LINES);
        Self(lines[start..].join("\n"))
    }
}

/// Interrupt hints the tools print while streaming a response
static RE_BUSY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(esc to interrupt|ctrl\+c to interrupt|esc to cancel)").unwrap()
});

static RE_WAITING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(waiting|approval|confirm|press enter)").unwrap());

/// Footer text shown by the tools when a turn has ended and they await input
static RE_IDLE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(context left|\? for shortcuts|type your message|for help)").unwrap()
});

static RE_DONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(done|finished|complete)").unwrap());

/// Split captured window text into trimmed, non-empty lines, keeping the
/// last `max_lines` of them (0 keeps everything).
pub fn normalize_lines(text: &str, max_lines: usize) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if max_lines > 0 && lines.len() > max_lines {
        lines.drain(..lines.len() - max_lines);
    }
    lines
}

/// Infer a session's status from its current lines.
///
/// With a previous fingerprint, changed output means RUNNING and an
/// unchanged screen with no recognisable marker means IDLE. On a session's
/// first poll there is nothing to compare against, so the text heuristics
/// decide alone and fall through to DONE/RUNNING.
pub fn classify(
    lines: &[String],
    previous: Option<&Fingerprint>,
    current: &Fingerprint,
) -> SessionStatus {
    if lines.is_empty() {
        return SessionStatus::Idle;
    }

    let start = lines.len().saturating_sub(LOOKBACK_LINES);
    let recent = lines[start..].join("\n");

    let changed = previous.is_some_and(|prev| prev != current);
    if changed || RE_BUSY.is_match(&recent) {
        return SessionStatus::Running;
    }

    if RE_WAITING.is_match(&recent) {
        return SessionStatus::Waiting;
    }

    let last = lines.last().map(String::as_str).unwrap_or("");
    if looks_like_prompt(last) || RE_IDLE_MARKER.is_match(&recent) {
        return SessionStatus::Idle;
    }

    match previous {
        Some(_) => SessionStatus::Idle,
        None if RE_DONE.is_match(&recent) => SessionStatus::Done,
        None => SessionStatus::Running,
    }
}

fn looks_like_prompt(line: &str) -> bool {
    const MARKERS: [&str; 3] = ["> ", "$ ", "% "];

    let trimmed = line.trim();
    matches!(trimmed, ">" | ">>" | "❯")
        || MARKERS
            .iter()
            .any(|m| trimmed.starts_with(m) || line.ends_with(m))
}
