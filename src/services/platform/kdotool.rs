use crate::model::WindowRecord;
use crate::services::command_runner::CommandRunner;
use std::sync::Arc;
use tracing::debug;

/// xdotool work-alike for KWin; works under Wayland.
pub struct Kdotool {
    runner: Arc<dyn CommandRunner>,
}

impl Kdotool {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn active_window(&self) -> Option<WindowRecord> {
        let id_output = self.runner.run("kdotool", &["getactivewindow"]).await;
        let Some(window_id) = id_output.text() else {
            debug!("kdotool getactivewindow failed: {}", id_output.stderr.trim());
            return None;
        };
        let window_id = window_id.to_string();

        let name_output = self.runner.run("kdotool", &["getwindowname", &window_id]).await;
        let title = name_output.text()?.to_string();

        let class_output = self
            .runner
            .run("kdotool", &["getwindowclassname", &window_id])
            .await;
        let class = class_output.text().unwrap_or_default().to_string();

        Some(WindowRecord::new(window_id, title).with_process(class))
    }
}
