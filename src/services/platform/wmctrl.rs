use crate::error::{FocusError, Result};
use crate::mappings::system_processes::is_internal_window;
use crate::model::WindowRecord;
use crate::services::command_runner::CommandRunner;
use std::sync::Arc;
use tracing::debug;

pub struct Wmctrl {
    runner: Arc<dyn CommandRunner>,
}

impl Wmctrl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Windows with their X11 class via `wmctrl -l -x`.
    pub async fn list(&self) -> Result<Vec<WindowRecord>> {
        let output = self.runner.run("wmctrl", &["-l", "-x"]).await;
        if !output.success {
            return Err(FocusError::command_failed("wmctrl", output.stderr.trim()));
        }
        Ok(parse_list(&output.stdout))
    }
}

/// Parses `wmctrl -l -x` lines: `<id> <desktop> <instance.Class> <host> <title…>`.
/// Malformed lines and internal helper windows are skipped.
pub fn parse_list(stdout: &str) -> Vec<WindowRecord> {
    let mut windows = Vec::new();

    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 || !parts[0].starts_with("0x") {
            if !line.trim().is_empty() {
                debug!("Skipping malformed wmctrl line: {}", line);
            }
            continue;
        }

        let id = parts[0];
        // `instance.Class`; both halves are useful for matching.
        let class = parts[2];
        let title = parts.get(4..).map(|rest| rest.join(" ")).unwrap_or_default();

        if class.split('.').any(|part| is_internal_window(&title, part)) {
            continue;
        }

        windows.push(WindowRecord::new(id, title).with_process(class));
    }

    windows
}
