use crate::error::Result;
use crate::model::WindowRecord;
use crate::services::command_runner::CommandRunner;
use std::sync::Arc;
use tracing::{debug, warn};

use super::fallback::{canonical_x11_id, to_hex_window_id, x11_minimize_chain};
use super::r#trait::WindowDriver;
use super::wmctrl::Wmctrl;
use super::xdotool::Xdotool;

/// Generic driver built on `wmctrl` and `xdotool`.
pub struct X11Driver {
    runner: Arc<dyn CommandRunner>,
    wmctrl: Wmctrl,
    xdotool: Xdotool,
}

impl X11Driver {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            wmctrl: Wmctrl::new(runner.clone()),
            xdotool: Xdotool::new(runner.clone()),
            runner,
        }
    }
}

#[async_trait::async_trait]
impl WindowDriver for X11Driver {
    fn name(&self) -> &'static str {
        "x11"
    }

    async fn enumerate(&self) -> Result<Vec<WindowRecord>> {
        match self.wmctrl.list().await {
            Ok(windows) => Ok(windows),
            Err(e) => {
                debug!("wmctrl unavailable ({}), trying xdotool search", e);
                self.xdotool.search_visible().await.map_err(|e| {
                    warn!("Could not list windows: {}", e);
                    e
                })
            }
        }
    }

    async fn active_window(&self) -> Option<WindowRecord> {
        self.xdotool.active_window().await
    }

    async fn minimize(&self, window: &WindowRecord) -> bool {
        let Some(hex_id) = to_hex_window_id(&window.id) else {
            debug!("Cannot minimize '{}': no usable window id", window.title);
            return false;
        };

        match x11_minimize_chain(&hex_id).run(self.runner.as_ref()).await {
            Some(step) => {
                debug!("Minimized '{}' via {}", window.title, step);
                true
            }
            None => false,
        }
    }

    fn window_key(&self, id: &str) -> String {
        canonical_x11_id(id).unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;
    use crate::services::command_runner::CommandOutput;

    #[tokio::test]
    async fn test_enumerate_uses_wmctrl() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(
            "wmctrl",
            "-l -x",
            CommandOutput::ok(
                "0x04000003  0 Navigator.firefox  host  Mozilla Firefox\n\
                 0x04200007  0 code.Code  host  lib.rs - Visual Studio Code\n",
            ),
        );

        let windows = X11Driver::new(runner.clone()).enumerate().await.unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].process_name, "code.Code");
        assert_eq!(runner.count_matching("xdotool", "search"), 0);
    }

    #[tokio::test]
    async fn test_enumerate_falls_back_to_xdotool() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on("xdotool", "search", CommandOutput::ok("67108867\n"))
            .on("xdotool", "getwindowname 67108867", CommandOutput::ok("Mozilla Firefox"));

        let windows = X11Driver::new(runner).enumerate().await.unwrap();
        assert_eq!(windows, vec![WindowRecord::new("67108867", "Mozilla Firefox")]);
    }

    #[tokio::test]
    async fn test_enumerate_error_when_no_tools() {
        let runner = Arc::new(ScriptedRunner::new());
        assert!(X11Driver::new(runner).enumerate().await.is_err());
    }

    #[tokio::test]
    async fn test_minimize_converts_decimal_id() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("xdotool", "windowminimize", CommandOutput::ok(""));

        let window = WindowRecord::new("67108867", "Mozilla Firefox");
        assert!(X11Driver::new(runner.clone()).minimize(&window).await);
        assert_eq!(
            runner.command_lines(),
            vec!["xdotool windowminimize 0x04000003".to_string()]
        );
    }

    #[tokio::test]
    async fn test_minimize_tries_whole_chain() {
        let runner = Arc::new(ScriptedRunner::new());
        let window = WindowRecord::new("0x04000003", "Mozilla Firefox");

        assert!(!X11Driver::new(runner.clone()).minimize(&window).await);
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn test_window_key_matches_wmctrl_and_xdotool_ids() {
        let driver = X11Driver::new(Arc::new(ScriptedRunner::new()));
        assert_eq!(driver.window_key("0x04000003"), driver.window_key("67108867"));
        assert_ne!(driver.window_key("0x04000003"), driver.window_key("0x04000004"));
    }

    #[tokio::test]
    async fn test_minimize_rejects_bad_id() {
        let runner = Arc::new(ScriptedRunner::new());
        let window = WindowRecord::new("not-an-id", "Mozilla Firefox");
        assert!(!X11Driver::new(runner.clone()).minimize(&window).await);
        assert!(runner.calls().is_empty());
    }
}
