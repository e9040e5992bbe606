use super::WindowSnapshot;

/// Decide which configured AI tool, if any, a window is running.
///
/// Every command-line token of every foreground process is checked, in order.
/// A token matches a prefix when its basename equals the prefix
/// (`/usr/local/bin/claude`), or when the prefix appears as a path component
/// (`node /.../@openai/codex/bin/run.js`), which catches tools launched as a
/// script under an interpreter. `prefixes` must already be lower-cased.
pub fn identify(window: &WindowSnapshot, prefixes: &[String]) -> Option<String> {
    window
        .processes
        .iter()
        .flat_map(|proc| proc.cmdline.iter())
        .find_map(|token| match_token(token, prefixes))
        .map(str::to_string)
}

fn match_token<'a>(token: &str, prefixes: &'a [String]) -> Option<&'a str> {
    if token.is_empty() {
        return None;
    }

    let lower = token.to_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);

    prefixes
        .iter()
        .map(String::as_str)
        .find(|p| {
            !p.is_empty()
                && (base == *p
                    || lower.contains(&format!("/{p}/"))
                    || lower.ends_with(&format!("/{p}")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitty::ProcessRecord;

    fn prefixes() -> Vec<String> {
        vec!["codex".into(), "claude".into(), "gemini".into()]
    }

    fn window(cmdlines: &[&[&str]]) -> WindowSnapshot {
        WindowSnapshot {
            id: 1,
            processes: cmdlines
                .iter()
                .map(|cmd| ProcessRecord {
                    cmdline: cmd.iter().map(|s| s.to_string()).collect(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_direct_binary() {
        let win = window(&[&["/usr/local/bin/claude"]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("claude"));
    }

    #[test]
    fn test_bare_command_with_args() {
        let win = window(&[&["gemini", "chat"]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("gemini"));
    }

    #[test]
    fn test_basename_is_case_insensitive() {
        let win = window(&[&["/opt/Claude"]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("claude"));
    }

    #[test]
    fn test_script_under_interpreter() {
        let win = window(&[&[
            "node",
            "/Users/dev/.local/share/mise/installs/node/24.5.0/bin/codex",
        ]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("codex"));
    }

    #[test]
    fn test_path_component_match() {
        let win = window(&[&[
            "node",
            "/usr/lib/node_modules/@openai/codex/vendor/aarch64-apple-darwin/cli.js",
        ]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("codex"));
    }

    #[test]
    fn test_vendored_binary_path() {
        let win = window(&[&[
            "/lib/node_modules/@openai/codex/vendor/aarch64-apple-darwin/codex/codex",
        ]]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("codex"));
    }

    #[test]
    fn test_first_process_wins() {
        let win = window(&[
            &["node", "/path/to/context7-mcp"],
            &["python", "/path/to/serena"],
            &["/path/to/@openai/codex/vendor/codex/codex"],
            &["/usr/local/bin/claude"],
        ]);
        assert_eq!(identify(&win, &prefixes()).as_deref(), Some("codex"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(identify(&window(&[&["node", "/some/other/script.js"]]), &prefixes()), None);
        assert_eq!(identify(&window(&[&["/bin/zsh"]]), &prefixes()), None);
        // Substrings that are not whole path components do not count
        assert_eq!(identify(&window(&[&["/home/claudette/bin/vim"]]), &prefixes()), None);
    }

    #[test]
    fn test_empty_windows() {
        assert_eq!(identify(&window(&[]), &prefixes()), None);
        assert_eq!(identify(&window(&[&[]]), &prefixes()), None);
        assert_eq!(identify(&window(&[&[""], &[]]), &prefixes()), None);
    }
}
