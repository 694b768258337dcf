use crate::error::{FocusError, Result};
use crate::mappings::system_processes::is_internal_window;
use crate::model::WindowRecord;
use crate::services::command_runner::CommandRunner;
use std::sync::Arc;
use tracing::debug;

pub struct Xdotool {
    runner: Arc<dyn CommandRunner>,
}

impl Xdotool {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn active_window(&self) -> Option<WindowRecord> {
        let id_output = self.runner.run("xdotool", &["getactivewindow"]).await;
        let window_id = id_output.text()?.to_string();
        self.describe(&window_id).await
    }

    /// Visible windows found by `xdotool search`, each resolved to its name.
    pub async fn search_visible(&self) -> Result<Vec<WindowRecord>> {
        let output = self
            .runner
            .run("xdotool", &["search", "--onlyvisible", "--name", ""])
            .await;
        if !output.success {
            return Err(FocusError::command_failed("xdotool", output.stderr.trim()));
        }

        let mut windows = Vec::new();
        for window_id in output.stdout.split_whitespace() {
            if window_id.parse::<u64>().is_err() {
                debug!("Skipping unexpected xdotool id: {}", window_id);
                continue;
            }
            if let Some(window) = self.describe(window_id).await {
                if !is_internal_window(&window.title, &window.process_name) {
                    windows.push(window);
                }
            }
        }
        Ok(windows)
    }

    async fn describe(&self, window_id: &str) -> Option<WindowRecord> {
        let name_output = self.runner.run("xdotool", &["getwindowname", window_id]).await;
        if !name_output.success {
            debug!("xdotool getwindowname {} failed: {}", window_id, name_output.stderr.trim());
            return None;
        }
        let title = name_output.stdout.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let class_output = self
            .runner
            .run("xdotool", &["getwindowclassname", window_id])
            .await;
        let class = class_output.text().unwrap_or_default().to_string();

        Some(WindowRecord::new(window_id, title).with_process(class))
    }
}
