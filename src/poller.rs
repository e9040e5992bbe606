use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::KittyError;
use crate::kitty::{classify, identify, normalize_lines, Fingerprint, WindowSource};
use crate::session::{Session, SessionRepository};

/// Last seen fingerprint per window id, carried from one poll to the next
pub type FingerprintTable = HashMap<u32, Fingerprint>;

/// Everything one poll produced. Replaces the previous snapshot wholesale.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    pub sessions: SessionRepository,
    pub fingerprints: FingerprintTable,
}

/// List all windows, classify the ones running an AI tool and build the
/// next session snapshot.
///
/// A failure to list windows aborts the whole poll. A failure to read one
/// window's text only empties that window's content.
pub async fn poll<S: WindowSource>(
    source: &S,
    config: &Config,
    previous: &FingerprintTable,
) -> Result<PollOutcome, KittyError> {
    let windows = source.list_windows().await?;

    let mut sessions = Vec::new();
    let mut fingerprints = FingerprintTable::new();

    for window in &windows {
        debug!(
            window = window.id,
            tab = %window.tab_title,
            procs = window.processes.len(),
            "checking window"
        );

        let Some(ai) = identify(window, &config.prefixes) else {
            continue;
        };

        let text = match source.get_text(window.id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(window = window.id, error = %e, "failed to read window text");
                String::new()
            }
        };

        let lines = normalize_lines(&text, config.max_lines);
        let fingerprint = Fingerprint::from_lines(&lines);
        let status = classify(&lines, previous.get(&window.id), &fingerprint);

        fingerprints.insert(window.id, fingerprint);
        sessions.push(Session::new(window, ai, status, lines));
    }

    info!(
        windows = windows.len(),
        sessions = sessions.len(),
        "poll complete"
    );

    Ok(PollOutcome {
        sessions: SessionRepository::new(sessions),
        fingerprints,
    })
}
