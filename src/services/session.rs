use crate::config::Config;
use crate::error::Result;
use crate::mappings::{ProcessAliasMap, SystemDenylist};
use crate::model::{AllowList, DependencyReport, EnvironmentInfo, WindowRecord};
use crate::services::allow_list_matcher::AllowListMatcher;
use crate::services::command_runner::{CommandRunner, SystemCommandRunner};
use crate::services::environment::EnvironmentDetector;
use crate::services::platform::{create_platform, DndController, Platform, WindowDriver};
use crate::utils;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::debug_if_enabled;

/// Outcome of one enumerate, match and minimize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub inspected: usize,
    pub minimized: usize,
    pub failed: usize,
}

/// Each session owns the receiving end of its own cancel channel. A closed
/// channel counts as cancelled.
fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    cancel.has_changed().is_err() || *cancel.borrow()
}

/// State shared with the monitor task.
struct EngineInner {
    driver: Arc<dyn WindowDriver>,
    dnd: Arc<dyn DndController>,
    matcher: AllowListMatcher,
    running: AtomicBool,
}

impl EngineInner {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Minimizes every disallowed window, then the foreground window if it
    /// was not covered. Stops acting as soon as `cancel` fires.
    async fn sweep(&self, allow_list: &AllowList, cancel: &watch::Receiver<bool>) -> SweepReport {
        let mut report = SweepReport::default();

        let windows = match self.driver.enumerate().await {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Window enumeration failed: {}", e);
                Vec::new()
            }
        };

        let mut handled = HashSet::new();
        for window in &windows {
            report.inspected += 1;
            if self.matcher.is_window_allowed(window, allow_list) {
                continue;
            }
            if is_cancelled(cancel) {
                return report;
            }
            self.minimize(window, &mut report).await;
            handled.insert(self.driver.window_key(&window.id));
        }

        // Some drivers leave the focused window out of bulk enumeration.
        if is_cancelled(cancel) {
            return report;
        }
        if let Some(active) = self.driver.active_window().await {
            let key = self.driver.window_key(&active.id);
            if !handled.contains(&key) && !self.matcher.is_window_allowed(&active, allow_list) {
                report.inspected += 1;
                if !is_cancelled(cancel) {
                    self.minimize(&active, &mut report).await;
                }
            }
        }

        debug_if_enabled!(
            "Sweep: {} inspected, {} minimized, {} failed",
            report.inspected,
            report.minimized,
            report.failed
        );
        report
    }

    async fn minimize(&self, window: &WindowRecord, report: &mut SweepReport) {
        if self.driver.minimize(window).await {
            debug!("Blocked {}", window);
            report.minimized += 1;
        } else {
            debug!("Could not minimize {}", window);
            report.failed += 1;
        }
    }
}

/// Focus-session state machine: `Idle` until `start`, `Blocking` until `stop`.
pub struct SessionEngine {
    inner: Arc<EngineInner>,
    /// Orders DND enable and disable between overlapping control calls.
    control: Mutex<()>,
    /// Cancel handle of the current session.
    session: parking_lot::Mutex<Option<watch::Sender<bool>>>,
    interval: Duration,
    environment: EnvironmentInfo,
    runner: Arc<dyn CommandRunner>,
}

impl SessionEngine {
    pub fn new(platform: Platform, matcher: AllowListMatcher, interval: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                driver: platform.windows,
                dnd: platform.dnd,
                matcher,
                running: AtomicBool::new(false),
            }),
            control: Mutex::new(()),
            session: parking_lot::Mutex::new(None),
            interval,
            environment: platform.environment,
            runner: platform.runner,
        }
    }

    /// Detect the desktop and wire the matching drivers.
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        let environment = EnvironmentDetector::new().detect();
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new(config.command_timeout()));
        let platform = create_platform(environment, runner, config, dry_run);
        let matcher = AllowListMatcher::new(
            SystemDenylist::for_desktop(environment.desktop),
            ProcessAliasMap::with_extra(&config.session.extra_aliases),
        );
        Self::new(platform, matcher, config.monitor_interval())
    }

    pub fn environment(&self) -> EnvironmentInfo {
        self.environment
    }

    pub fn driver_name(&self) -> &'static str {
        self.inner.driver.name()
    }

    pub fn is_blocking(&self) -> bool {
        self.inner.is_running()
    }

    /// Begin blocking. A second call while blocking does nothing.
    ///
    /// The control lock covers only the DND switch, so `stop` can cancel
    /// the initial sweep while it runs.
    pub async fn start(&self, allow_list: AllowList) {
        let control = self.control.lock().await;
        if self.inner.is_running() {
            debug!("Session already running");
            return;
        }

        let (cancel_tx, cancel) = watch::channel(false);
        {
            let mut session = self.session.lock();
            *session = Some(cancel_tx);
            self.inner.running.store(true, Ordering::SeqCst);
        }
        info!("Focus session started, allowed: {:?}", allow_list.iter().collect::<Vec<_>>());

        self.inner.dnd.enable().await;
        drop(control);

        if is_cancelled(&cancel) {
            debug!("Session stopped while enabling do-not-disturb");
            return;
        }
        if allow_list.is_empty() {
            info!("Allow-list is empty; windows will not be monitored");
            return;
        }

        let report = self.inner.sweep(&allow_list, &cancel).await;
        if is_cancelled(&cancel) {
            debug!("Session stopped during the initial sweep");
            return;
        }
        info!("Initial sweep minimized {} window(s)", report.minimized);

        tokio::spawn(monitor_loop(self.inner.clone(), allow_list, self.interval, cancel));
    }

    /// End blocking and restore DND. No-op when idle.
    ///
    /// The session is cancelled before waiting on a `start` that is still
    /// enabling DND; results of an in-flight sweep are discarded.
    pub async fn stop(&self) {
        let cancel = {
            let mut session = self.session.lock();
            if !self.inner.running.swap(false, Ordering::SeqCst) {
                debug!("No session to stop");
                return;
            }
            session.take()
        };
        if let Some(cancel) = cancel {
            let _ = cancel.send(true);
        }

        let _control = self.control.lock().await;
        self.inner.dnd.disable().await;
        info!("Focus session stopped");
    }

    /// Pausing is stopping; the surrounding timer keeps its own countdown.
    pub async fn pause(&self) {
        self.stop().await;
    }

    pub async fn resume(&self, allow_list: AllowList) {
        self.start(allow_list).await;
    }

    /// Runs one session until `shutdown` resolves, then restores the
    /// desktop within `shutdown_timeout`. `shutdown` is watched from the
    /// first moment, including while DND is enabled and the initial sweep
    /// runs.
    pub async fn run_until<F>(&self, allow_list: AllowList, shutdown: F, shutdown_timeout: Duration)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let start = self.start(allow_list);
        tokio::pin!(start);

        let started = tokio::select! {
            _ = &mut start => true,
            _ = &mut shutdown => false,
        };
        if started {
            shutdown.await;
        } else {
            info!("Shutdown requested while the session was starting");
        }

        info!("Shutting down...");
        let teardown = async {
            if !started {
                tokio::join!(start, self.stop());
            }
            // Also covers a start that had not switched anything on when
            // the first stop ran.
            self.stop().await;
        };
        match tokio::time::timeout(shutdown_timeout, teardown).await {
            Ok(()) => info!("Session ended cleanly"),
            Err(_) => warn!("Timed out while restoring the desktop"),
        }
    }

    pub async fn check_dependencies(&self) -> DependencyReport {
        utils::check_dependencies(self.runner.as_ref(), self.environment).await
    }

    /// Smoke test: can the driver list at least one window?
    pub async fn test_window_control(&self) -> bool {
        match self.inner.driver.enumerate().await {
            Ok(windows) => {
                info!("{} driver sees {} window(s)", self.inner.driver.name(), windows.len());
                !windows.is_empty()
            }
            Err(e) => {
                warn!("{} driver cannot list windows: {}", self.inner.driver.name(), e);
                false
            }
        }
    }

    /// Current windows paired with whether `allow_list` lets them stay.
    pub async fn list_windows(&self, allow_list: &AllowList) -> Result<Vec<(WindowRecord, bool)>> {
        let windows = self.inner.driver.enumerate().await?;
        Ok(windows
            .into_iter()
            .map(|window| {
                let allowed = self.inner.matcher.is_window_allowed(&window, allow_list);
                (window, allowed)
            })
            .collect())
    }
}

async fn monitor_loop(
    inner: Arc<EngineInner>,
    allow_list: AllowList,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let session = cancel.clone();
    debug!("Monitor loop running every {}ms", period.as_millis());

    loop {
        tokio::select! {
            biased;

            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if is_cancelled(&session) {
                    break;
                }
                inner.sweep(&allow_list, &session).await;
            }
        }
    }

    debug!("Monitor loop finished");
}
