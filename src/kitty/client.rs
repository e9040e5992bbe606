use std::process::Output;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{ProcessRecord, WindowSnapshot, WindowSource};
use crate::error::KittyError;

/// `kitty @ ls` output: OS windows containing tabs containing windows
#[derive(Debug, Deserialize)]
pub(crate) struct KittyOsWindow {
    #[serde(default)]
    pub tabs: Vec<KittyTab>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KittyTab {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub windows: Vec<KittyWindow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KittyWindow {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub foreground_processes: Vec<ProcessRecord>,
}

/// Parse `kitty @ ls` JSON into a flat list of windows, in listing order
pub(crate) fn parse_ls(json: &[u8]) -> Result<Vec<WindowSnapshot>, KittyError> {
    let os_windows: Vec<KittyOsWindow> = serde_json::from_slice(json)?;

    let windows = os_windows
        .into_iter()
        .flat_map(|ow| ow.tabs)
        .flat_map(|tab| {
            let tab_id = tab.id;
            let tab_title = tab.title;
            tab.windows.into_iter().map(move |win| WindowSnapshot {
                id: win.id,
                tab_id,
                title: win.title,
                tab_title: tab_title.clone(),
                cwd: win.cwd,
                processes: win.foreground_processes,
            })
        })
        .collect();

    Ok(windows)
}

/// Client for kitty's remote-control CLI (`kitty @ ...`)
#[derive(Debug, Clone)]
pub struct KittyClient {
    /// Path to kitty binary
    kitty_path: String,
    /// Remote-control address passed via `--to`
    socket: Option<String>,
}

impl KittyClient {
    pub fn new(socket: Option<String>) -> Self {
        Self {
            kitty_path: "kitty".to_string(),
            socket,
        }
    }

    /// Full argument list for a remote-control subcommand
    fn args<'a>(&'a self, sub: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["@"];
        if let Some(socket) = &self.socket {
            args.extend(["--to", socket.as_str()]);
        }
        args.extend_from_slice(sub);
        args
    }

    async fn run(&self, sub: &[&str]) -> Result<Output, KittyError> {
        let args = self.args(sub);
        let command = format!("{} {}", self.kitty_path, args.join(" "));

        let output = Command::new(&self.kitty_path)
            .args(&args)
            .output()
            .await
            .map_err(|source| KittyError::Spawn {
                command: command.clone(),
                source,
            })?;

        debug!(%command, status = %output.status, bytes = output.stdout.len(), "kitty call");

        if !output.status.success() {
            return Err(KittyError::Exit {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }

    /// Raw `kitty @ ls` output, for debug dumps
    pub async fn list_raw(&self) -> Result<Vec<u8>, KittyError> {
        Ok(self.run(&["ls"]).await?.stdout)
    }
}

impl Default for KittyClient {
    fn default() -> Self {
        Self::new(None)
    }
}

impl WindowSource for KittyClient {
    async fn list_windows(&self) -> Result<Vec<WindowSnapshot>, KittyError> {
        let raw = self.list_raw().await?;
        parse_ls(&raw)
    }

    async fn get_text(&self, window_id: u32) -> Result<String, KittyError> {
        let matcher = format!("id:{window_id}");
        let output = self.run(&["get-text", "--match", &matcher]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn focus_window(&self, window_id: u32) -> Result<(), KittyError> {
        if window_id == 0 {
            return Ok(());
        }
        let matcher = format!("id:{window_id}");
        self.run(&["focus-window", "--match", &matcher]).await?;
        Ok(())
    }

    async fn rename_window(&self, window_id: u32, title: &str) -> Result<(), KittyError> {
        if window_id == 0 {
            return Ok(());
        }
        let matcher = format!("id:{window_id}");
        self.run(&["set-window-title", "--match", &matcher, title]).await?;
        Ok(())
    }
}
