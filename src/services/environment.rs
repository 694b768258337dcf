use crate::model::{DesktopFamily, EnvironmentInfo};
use once_cell::sync::OnceCell;
use tracing::info;

/// Session desktop identifier, e.g. `KDE`, `ubuntu:GNOME`, `XFCE`.
const DESKTOP_VAR: &str = "XDG_CURRENT_DESKTOP";
/// Display protocol, `wayland` or `x11`.
const SESSION_TYPE_VAR: &str = "XDG_SESSION_TYPE";

/// Detects the desktop family and display protocol once and caches the
/// result for the lifetime of the detector.
#[derive(Debug, Default)]
pub struct EnvironmentDetector {
    cached: OnceCell<EnvironmentInfo>,
}

impl EnvironmentDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector that always reports `info`.
    pub fn fixed(info: EnvironmentInfo) -> Self {
        let cached = OnceCell::new();
        let _ = cached.set(info);
        Self { cached }
    }

    pub fn detect(&self) -> EnvironmentInfo {
        *self.cached.get_or_init(|| {
            let info = if cfg!(windows) {
                EnvironmentInfo {
                    desktop: DesktopFamily::Windows,
                    is_wayland: false,
                }
            } else if cfg!(target_os = "macos") {
                EnvironmentInfo {
                    desktop: DesktopFamily::MacOs,
                    is_wayland: false,
                }
            } else {
                classify(
                    std::env::var(DESKTOP_VAR).ok().as_deref(),
                    std::env::var(SESSION_TYPE_VAR).ok().as_deref(),
                )
            };
            info!("Detected desktop environment: {}", info);
            info
        })
    }
}

/// Maps the raw session variables to an [`EnvironmentInfo`]. Missing or
/// unreadable variables yield `other` / not Wayland.
pub fn classify(desktop_var: Option<&str>, session_var: Option<&str>) -> EnvironmentInfo {
    let desktop = match desktop_var.map(str::to_lowercase) {
        Some(d) if d.contains("kde") || d.contains("plasma") => DesktopFamily::Kde,
        Some(d) if d.contains("gnome") => DesktopFamily::Gnome,
        Some(d) if d.contains("xfce") => DesktopFamily::Xfce,
        _ => DesktopFamily::Other,
    };

    let is_wayland = session_var.map(str::trim) == Some("wayland");

    EnvironmentInfo { desktop, is_wayland }
}
