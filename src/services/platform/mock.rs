//! In-memory drivers for session tests.

use crate::error::Result;
use crate::focus_error;
use crate::model::WindowRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::dnd::DndState;
use super::r#trait::{DndController, WindowDriver};

#[derive(Default)]
pub struct MockWindowDriver {
    windows: Mutex<Vec<WindowRecord>>,
    active: Mutex<Option<WindowRecord>>,
    minimized: Mutex<Vec<WindowRecord>>,
    enumerate_calls: AtomicUsize,
    failures_left: AtomicUsize,
    minimize_delay: Mutex<Duration>,
}

impl MockWindowDriver {
    pub fn new(windows: Vec<WindowRecord>) -> Self {
        Self {
            windows: Mutex::new(windows),
            ..Self::default()
        }
    }

    pub fn set_windows(&self, windows: Vec<WindowRecord>) {
        *self.windows.lock() = windows;
    }

    pub fn set_active(&self, window: Option<WindowRecord>) {
        *self.active.lock() = window;
    }

    /// The next `n` enumerations fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Every minimize is recorded when requested, then takes `delay`.
    pub fn set_minimize_delay(&self, delay: Duration) {
        *self.minimize_delay.lock() = delay;
    }

    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn minimized(&self) -> Vec<WindowRecord> {
        self.minimized.lock().clone()
    }

    pub fn minimized_titles(&self) -> Vec<String> {
        self.minimized.lock().iter().map(|w| w.title.clone()).collect()
    }
}

#[async_trait::async_trait]
impl WindowDriver for MockWindowDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn enumerate(&self) -> Result<Vec<WindowRecord>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(focus_error!(tool_unavailable, "mock enumeration failure"));
        }
        Ok(self.windows.lock().clone())
    }

    async fn active_window(&self) -> Option<WindowRecord> {
        self.active.lock().clone()
    }

    async fn minimize(&self, window: &WindowRecord) -> bool {
        self.minimized.lock().push(window.clone());
        let delay = *self.minimize_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        true
    }
}

#[derive(Default)]
pub struct MockDnd {
    state: DndState,
    enable_calls: AtomicUsize,
    disable_calls: AtomicUsize,
    toggles: AtomicUsize,
    preexisting: bool,
}

impl MockDnd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that finds DND already switched on by the user.
    pub fn preexisting() -> Self {
        Self {
            preexisting: true,
            ..Self::default()
        }
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }

    /// Underlying DND switches performed.
    pub fn toggles(&self) -> usize {
        self.toggles.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DndController for MockDnd {
    async fn enable(&self) {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if self.preexisting || self.state.is_ours() {
            return;
        }
        self.toggles.fetch_add(1, Ordering::SeqCst);
        self.state.mark();
    }

    async fn disable(&self) {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.take() {
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn we_enabled_it(&self) -> bool {
        self.state.is_ours()
    }
}
