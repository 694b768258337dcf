use crate::config::KdeConfig;
use crate::error::Result;
use crate::mappings::system_processes::is_internal_window;
use crate::model::WindowRecord;
use crate::services::command_runner::CommandRunner;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::fallback::{canonical_x11_id, to_hex_window_id, x11_minimize_chain};
use super::kdotool::Kdotool;
use super::kwin_script::{minimize_script, sanitize_caption, KwinScript};
use super::qdbus::Qdbus;
use super::r#trait::WindowDriver;
use super::wmctrl::Wmctrl;
use super::xdotool::Xdotool;
use crate::debug_if_enabled;

/// Struct signature that prefixes every match in a `--literal` KRunner reply.
const MATCH_MARKER: &str = "(sssida{sv}) ";

/// KWin driver. Enumerates through the KRunner window runner and minimizes
/// through KWin scripting, so it works on both X11 and Wayland sessions.
pub struct KdeDriver {
    runner: Arc<dyn CommandRunner>,
    qdbus: Arc<Qdbus>,
    wmctrl: Wmctrl,
    kdotool: Kdotool,
    xdotool: Xdotool,
    is_wayland: bool,
    settle: Duration,
    caption_max_len: usize,
}

impl KdeDriver {
    pub fn new(runner: Arc<dyn CommandRunner>, qdbus: Arc<Qdbus>, is_wayland: bool, config: &KdeConfig) -> Self {
        Self {
            wmctrl: Wmctrl::new(runner.clone()),
            kdotool: Kdotool::new(runner.clone()),
            xdotool: Xdotool::new(runner.clone()),
            runner,
            qdbus,
            is_wayland,
            settle: Duration::from_millis(config.script_settle_ms),
            caption_max_len: config.caption_max_len,
        }
    }

    async fn windows_runner(&self) -> Option<Vec<WindowRecord>> {
        let output = self
            .qdbus
            .call(&[
                "--literal",
                "org.kde.KWin",
                "/WindowsRunner",
                "org.kde.krunner1.Match",
                "",
            ])
            .await;
        if !output.success {
            debug!("KRunner window query failed: {}", output.stderr.trim());
            return None;
        }
        Some(parse_runner_matches(&output.stdout))
    }

    async fn minimize_by_script(&self, caption: &str) -> bool {
        let fragment = sanitize_caption(caption, self.caption_max_len);
        if fragment.trim().is_empty() {
            return false;
        }

        let script = match KwinScript::load(self.qdbus.clone(), &minimize_script(&fragment)).await {
            Ok(script) => script,
            Err(e) => {
                debug!("KWin script unavailable: {}", e);
                return false;
            }
        };

        let started = script.run(self.settle).await;
        script.release().await;
        started
    }
}

#[async_trait::async_trait]
impl WindowDriver for KdeDriver {
    fn name(&self) -> &'static str {
        "kde"
    }

    async fn enumerate(&self) -> Result<Vec<WindowRecord>> {
        if let Some(windows) = self.windows_runner().await {
            debug_if_enabled!("KRunner reported {} windows", windows.len());
            return Ok(windows);
        }

        match self.wmctrl.list().await {
            Ok(windows) => Ok(windows),
            Err(e) => {
                warn!("Could not list KDE windows: {}", e);
                Err(e)
            }
        }
    }

    async fn active_window(&self) -> Option<WindowRecord> {
        if let Some(window) = self.kdotool.active_window().await {
            return Some(window);
        }
        self.xdotool.active_window().await
    }

    async fn minimize(&self, window: &WindowRecord) -> bool {
        if self.minimize_by_script(&window.title).await {
            debug!("Minimized '{}' via KWin script", window.title);
            return true;
        }

        if self.is_wayland {
            return false;
        }

        match to_hex_window_id(&window.id) {
            Some(hex_id) => x11_minimize_chain(&hex_id).run(self.runner.as_ref()).await.is_some(),
            None => false,
        }
    }

    /// KRunner prefixes the kdotool `{uuid}` with `0_`; X11 fallbacks mix
    /// hex and decimal ids.
    fn window_key(&self, id: &str) -> String {
        let id = id.strip_prefix("0_").unwrap_or(id);
        if id.starts_with('{') {
            return id.to_string();
        }
        canonical_x11_id(id).unwrap_or_else(|| id.to_string())
    }
}

/// Extracts `(id, caption, resourceClass)` from a `qdbus --literal` reply to
/// `org.kde.krunner1.Match`. Duplicate ids, malformed entries and internal
/// windows are skipped.
pub fn parse_runner_matches(stdout: &str) -> Vec<WindowRecord> {
    let mut seen = HashSet::new();
    let mut windows = Vec::new();

    for entry in stdout.split(MATCH_MARKER).skip(1) {
        let Some((id, rest)) = take_quoted(entry) else {
            continue;
        };
        let Some((caption, rest)) = take_quoted(rest) else {
            continue;
        };
        let Some((class, _)) = take_quoted(rest) else {
            continue;
        };

        if id.is_empty() || caption.is_empty() {
            continue;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        if is_internal_window(&caption, &class) {
            continue;
        }

        windows.push(WindowRecord::new(id, caption).with_process(class));
    }

    windows
}

/// Reads one `"…"` string, skipping a leading `,` and whitespace. Returns the
/// unescaped contents and the remainder after the closing quote.
fn take_quoted(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start().strip_prefix(',').unwrap_or(input).trim_start();
    let body = input.strip_prefix('"')?;

    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return Some((value, &body[i + 1..])),
            _ => value.push(c),
        }
    }
    None
}
