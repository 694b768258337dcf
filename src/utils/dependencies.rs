use crate::model::{DependencyReport, EnvironmentInfo};
use crate::services::command_runner::CommandRunner;
use crate::services::platform::QDBUS_CANDIDATES;
use tracing::{info, warn};

/// Check which window-control tools are installed for the detected desktop.
pub async fn check_dependencies(runner: &dyn CommandRunner, env: EnvironmentInfo) -> DependencyReport {
    info!("Checking window-control dependencies...");

    if env.desktop == crate::model::DesktopFamily::Windows {
        return DependencyReport::windows();
    }

    let mut has_qdbus = false;
    for candidate in QDBUS_CANDIDATES {
        if runner.is_available(candidate).await {
            has_qdbus = true;
            break;
        }
    }

    let report = DependencyReport {
        has_wmctrl: runner.is_available("wmctrl").await,
        has_xdotool: runner.is_available("xdotool").await,
        has_qdbus,
        has_dbus_send: runner.is_available("dbus-send").await,
        has_kdotool: runner.is_available("kdotool").await,
        is_wayland: env.is_wayland,
        is_windows: false,
        desktop: env.desktop,
    };

    for warning in report.warnings() {
        warn!("{}", warning);
    }

    report
}
