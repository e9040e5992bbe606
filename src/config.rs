// Runtime configuration
//
// Built once from the command line and the environment at startup, then
// handed to the poller, the kitty client and the app.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PREFIXES: &str = "codex,claude,gemini";
const DEFAULT_MAX_LINES: usize = 200;
const DEFAULT_POLL: Duration = Duration::from_secs(1);
const MAX_POLL: Duration = Duration::from_secs(24 * 60 * 60);

/// lazyccg - watch Codex, Claude and Gemini sessions running in kitty
#[derive(Debug, Parser)]
#[command(name = "lazyccg", version = VERSION, about, long_about = None)]
pub struct Cli {
    /// Poll interval (e.g. 1s, 500ms, 2m; a bare number means seconds)
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub poll: Duration,

    /// Comma-separated process names to detect
    #[arg(long, default_value = DEFAULT_PREFIXES, value_parser = parse_prefixes)]
    pub prefixes: Prefixes,

    /// Max lines to keep per session (0 keeps everything)
    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    pub max_lines: usize,

    /// kitty remote-control address (e.g. unix:/tmp/mykitty)
    #[arg(long)]
    pub kitty_socket: Option<String>,

    /// Dump detected windows and sessions, then exit
    #[arg(long)]
    pub debug: bool,

    /// Run without the alternate screen
    #[arg(long)]
    pub no_alt_screen: bool,

    /// Where to write logs
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Parsed `--prefixes` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes(pub Vec<String>);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    /// Lower-cased AI tool names to look for
    pub prefixes: Vec<String>,
    pub max_lines: usize,
    /// Address passed to `kitty @ --to`
    pub kitty_socket: Option<String>,
    pub debug_dump: bool,
    pub alt_screen: bool,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL,
            prefixes: split_prefixes(DEFAULT_PREFIXES),
            max_lines: DEFAULT_MAX_LINES,
            kitty_socket: None,
            debug_dump: false,
            alt_screen: true,
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Parse the command line and resolve environment-dependent settings
    pub fn load() -> Self {
        Self::from_cli(Cli::parse(), |key| std::env::var(key).ok(), |p| p.exists())
    }

    pub fn from_cli(
        cli: Cli,
        env: impl Fn(&str) -> Option<String>,
        exists: impl Fn(&Path) -> bool,
    ) -> Self {
        Self {
            poll_interval: cli.poll,
            prefixes: cli.prefixes.0,
            max_lines: cli.max_lines,
            kitty_socket: resolve_socket(cli.kitty_socket, env, exists),
            debug_dump: cli.debug,
            alt_screen: !cli.no_alt_screen,
            log_file: cli.log_file.unwrap_or_else(default_log_file),
        }
    }
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("lazyccg-tui.log")
}

/// Pick the kitty remote-control address: explicit flag, then
/// `KITTY_LISTEN_ON`, then the per-instance socket kitty creates for
/// `KITTY_PID` if it exists.
pub fn resolve_socket(
    flag: Option<String>,
    env: impl Fn(&str) -> Option<String>,
    exists: impl Fn(&Path) -> bool,
) -> Option<String> {
    let non_empty = |s: String| (!s.is_empty()).then_some(s);

    flag.and_then(non_empty)
        .or_else(|| env("KITTY_LISTEN_ON").and_then(non_empty))
        .or_else(|| {
            let pid = env("KITTY_PID").and_then(non_empty)?;
            let path = PathBuf::from(format!("/tmp/kitty-{pid}"));
            exists(&path).then(|| format!("unix:{}", path.display()))
        })
}

fn split_prefixes(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_prefixes(s: &str) -> Result<Prefixes, String> {
    let prefixes = split_prefixes(s);
    if prefixes.is_empty() {
        return Err("at least one prefix is required".to_string());
    }
    Ok(Prefixes(prefixes))
}

/// Parse `500ms`, `2s`, `1m` or a bare number of seconds
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{s}'"))?;

    let duration = match unit {
        "ms" => Duration::from_millis(n),
        "" | "s" => Duration::from_secs(n),
        "m" => Duration::from_secs(n.checked_mul(60).ok_or_else(|| too_long(s))?),
        _ => return Err(format!("unknown duration unit '{unit}' (use ms, s or m)")),
    };

    if duration.is_zero() {
        return Err("poll interval must be greater than zero".to_string());
    }
    if duration > MAX_POLL {
        return Err(too_long(s));
    }
    Ok(duration)
}

fn too_long(s: &str) -> String {
    format!("poll interval '{s}' is longer than a day")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["lazyccg"]);
        let config = Config::from_cli(cli, no_env, |_| false);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.prefixes, vec!["codex", "claude", "gemini"]);
        assert_eq!(config.max_lines, 200);
        assert_eq!(config.kitty_socket, None);
        assert!(config.alt_screen);
        assert!(!config.debug_dump);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "lazyccg",
            "--poll",
            "250ms",
            "--prefixes",
            " Claude, ,AIDER ",
            "--max-lines",
            "0",
            "--no-alt-screen",
            "--log-file",
            "/var/log/lazyccg.log",
        ]);
        let config = Config::from_cli(cli, no_env, |_| false);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.prefixes, vec!["claude", "aider"]);
        assert_eq!(config.max_lines, 0);
        assert!(!config.alt_screen);
        assert_eq!(config.log_file, PathBuf::from("/var/log/lazyccg.log"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["lazyccg", "--prefixes", " , "]).is_err());
        assert!(Cli::try_parse_from(["lazyccg", "--poll", "0s"]).is_err());
        assert!(Cli::try_parse_from(["lazyccg", "--poll", "fast"]).is_err());
        assert!(Cli::try_parse_from(["lazyccg", "--poll", "3h"]).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("750ms"), Ok(Duration::from_millis(750)));
        assert!(parse_duration("").is_err());
        assert_eq!(parse_duration("1440m"), Ok(MAX_POLL));
        assert!(parse_duration("1441m").is_err());
        assert!(parse_duration("86401").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
        assert!(parse_duration("18446744073709551615").is_err());
    }

    #[test]
    fn test_socket_resolution_order() {
        let env = |key: &str| match key {
            "KITTY_LISTEN_ON" => Some("unix:/tmp/listen".to_string()),
            "KITTY_PID" => Some("4242".to_string()),
            _ => None,
        };
        assert_eq!(
            resolve_socket(Some("unix:/tmp/flag".into()), env, |_| true),
            Some("unix:/tmp/flag".to_string())
        );
        assert_eq!(
            resolve_socket(None, env, |_| true),
            Some("unix:/tmp/listen".to_string())
        );

        let pid_only = |key: &str| (key == "KITTY_PID").then(|| "4242".to_string());
        assert_eq!(
            resolve_socket(None, pid_only, |p| p == Path::new("/tmp/kitty-4242")),
            Some("unix:/tmp/kitty-4242".to_string())
        );
        assert_eq!(resolve_socket(None, pid_only, |_| false), None);
        assert_eq!(resolve_socket(Some(String::new()), no_env, |_| true), None);
    }
}
