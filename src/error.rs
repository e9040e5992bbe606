use std::process::ExitStatus;

use thiserror::Error;

/// Failures talking to kitty's remote-control interface
#[derive(Debug, Error)]
pub enum KittyError {
    /// The kitty binary could not be started at all
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// kitty ran but reported failure
    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    /// `kitty @ ls` produced output we could not understand
    #[error("malformed kitty output: {0}")]
    Parse(#[from] serde_json::Error),
}

impl KittyError {
    /// Whether this is a structured-output problem rather than a transport failure
    pub fn is_parse(&self) -> bool {
        matches!(self, KittyError::Parse(_))
    }
}
