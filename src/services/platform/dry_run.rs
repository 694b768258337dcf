use crate::error::Result;
use crate::model::WindowRecord;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::dnd::DndState;
use super::r#trait::{DndController, WindowDriver};

const FAKE_WINDOWS: &[(&str, &str, &str)] = &[
    ("dry-1", "Terminal - dry_run", "konsole"),
    ("dry-2", "Mozilla Firefox - dry_run", "firefox"),
    ("dry-3", "main.rs - Visual Studio Code - dry_run", "code"),
    ("dry-4", "Steam - dry_run", "steam"),
];

/// Emulated desktop. Minimized windows disappear from later enumerations,
/// nothing on the real desktop is touched.
pub struct DryRunDriver {
    minimized: Mutex<HashSet<String>>,
    focus_index: AtomicUsize,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self {
            minimized: Mutex::new(HashSet::new()),
            focus_index: AtomicUsize::new(0),
        }
    }

    fn visible(&self) -> Vec<WindowRecord> {
        let minimized = self.minimized.lock();
        FAKE_WINDOWS
            .iter()
            .filter(|(id, _, _)| !minimized.contains(*id))
            .map(|(id, title, class)| WindowRecord::new(*id, *title).with_process(*class))
            .collect()
    }
}

impl Default for DryRunDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WindowDriver for DryRunDriver {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn enumerate(&self) -> Result<Vec<WindowRecord>> {
        Ok(self.visible())
    }

    /// Cycles focus through the windows that are still visible.
    async fn active_window(&self) -> Option<WindowRecord> {
        let visible = self.visible();
        if visible.is_empty() {
            return None;
        }
        let index = self.focus_index.fetch_add(1, Ordering::Relaxed) % visible.len();
        visible.into_iter().nth(index)
    }

    async fn minimize(&self, window: &WindowRecord) -> bool {
        info!("Dry run: would minimize '{}' ({})", window.title, window.id);
        self.minimized.lock().insert(window.id.clone());
        true
    }
}

pub struct DryRunDnd {
    state: DndState,
}

impl DryRunDnd {
    pub fn new() -> Self {
        Self { state: DndState::new() }
    }
}

impl Default for DryRunDnd {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DndController for DryRunDnd {
    async fn enable(&self) {
        if !self.state.is_ours() {
            info!("Dry run: would enable do-not-disturb");
            self.state.mark();
        }
    }

    async fn disable(&self) {
        if self.state.take() {
            info!("Dry run: would disable do-not-disturb");
        }
    }

    fn we_enabled_it(&self) -> bool {
        self.state.is_ours()
    }
}
