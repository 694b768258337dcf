use crate::config::Config;
use crate::error::Result;
use crate::model::{DesktopFamily, EnvironmentInfo, WindowRecord};
use crate::services::command_runner::CommandRunner;
use std::sync::Arc;
use tracing::info;

use super::dnd::{KdeDnd, PreferenceDnd, QdbusInhibitionSource, ZbusInhibitionSource};
use super::dry_run::{DryRunDnd, DryRunDriver};
use super::kde::KdeDriver;
use super::qdbus::Qdbus;
use super::windows::WindowsDriver;
use super::x11::X11Driver;

/// Lists and minimizes top-level windows on one platform.
#[async_trait::async_trait]
pub trait WindowDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fresh list of open windows. `Err` means every mechanism failed.
    async fn enumerate(&self) -> Result<Vec<WindowRecord>>;

    /// Foreground window, if it can be determined.
    async fn active_window(&self) -> Option<WindowRecord>;

    /// `true` if at least one mechanism reported success.
    async fn minimize(&self, window: &WindowRecord) -> bool;

    /// Key under which different spellings of one window id compare equal.
    /// Enumeration and the active-window lookup may use different tools.
    fn window_key(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Toggles OS notification suppression. Failures are logged, never returned.
#[async_trait::async_trait]
pub trait DndController: Send + Sync {
    async fn enable(&self);

    /// No-op unless this controller turned DND on.
    async fn disable(&self);

    fn we_enabled_it(&self) -> bool;
}

/// The capability set selected for the running desktop.
pub struct Platform {
    pub environment: EnvironmentInfo,
    pub runner: Arc<dyn CommandRunner>,
    pub windows: Arc<dyn WindowDriver>,
    pub dnd: Arc<dyn DndController>,
}

/// Pick the drivers for `environment`. Dry runs get emulated drivers that
/// never touch the desktop.
pub fn create_platform(
    environment: EnvironmentInfo,
    runner: Arc<dyn CommandRunner>,
    config: &Config,
    dry_run: bool,
) -> Platform {
    if dry_run {
        info!("Dry run: using emulated window driver");
        return Platform {
            environment,
            runner,
            windows: Arc::new(DryRunDriver::new()),
            dnd: Arc::new(DryRunDnd::new()),
        };
    }

    let dnd_timeout = config.dnd_timeout();

    let (windows, dnd): (Arc<dyn WindowDriver>, Arc<dyn DndController>) = match environment.desktop {
        DesktopFamily::Windows => (
            Arc::new(WindowsDriver::new(runner.clone())),
            Arc::new(PreferenceDnd::windows(runner.clone(), dnd_timeout)),
        ),
        DesktopFamily::Kde => {
            let qdbus = Arc::new(Qdbus::new(runner.clone()));
            let driver = KdeDriver::new(runner.clone(), qdbus.clone(), environment.is_wayland, &config.kde);
            let dnd = KdeDnd::new(
                qdbus.clone(),
                vec![
                    Box::new(ZbusInhibitionSource::new(config.command_timeout())),
                    Box::new(QdbusInhibitionSource::new(qdbus)),
                ],
                config.kde.show_osd,
            );
            (Arc::new(driver), Arc::new(dnd))
        }
        DesktopFamily::MacOs => (
            Arc::new(X11Driver::new(runner.clone())),
            Arc::new(PreferenceDnd::macos(runner.clone(), dnd_timeout)),
        ),
        DesktopFamily::Gnome | DesktopFamily::Xfce | DesktopFamily::Other => (
            Arc::new(X11Driver::new(runner.clone())),
            Arc::new(PreferenceDnd::gnome(runner.clone(), dnd_timeout)),
        ),
    };

    info!("Using {} window driver for {}", windows.name(), environment);

    Platform {
        environment,
        runner,
        windows,
        dnd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;

    fn env(desktop: DesktopFamily) -> EnvironmentInfo {
        EnvironmentInfo {
            desktop,
            is_wayland: false,
        }
    }

    #[test]
    fn test_driver_selection() {
        let config = Config::default();
        let runner: Arc<dyn CommandRunner> = Arc::new(ScriptedRunner::new());

        let cases = [
            (DesktopFamily::Kde, "kde"),
            (DesktopFamily::Gnome, "x11"),
            (DesktopFamily::Xfce, "x11"),
            (DesktopFamily::Other, "x11"),
            (DesktopFamily::Windows, "windows"),
        ];
        for (desktop, expected) in cases {
            let platform = create_platform(env(desktop), runner.clone(), &config, false);
            assert_eq!(platform.windows.name(), expected);
        }

        let platform = create_platform(env(DesktopFamily::Kde), runner, &config, true);
        assert_eq!(platform.windows.name(), "dry-run");
    }
}
