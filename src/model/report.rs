use super::environment::DesktopFamily;
use serde::{Deserialize, Serialize};

/// Availability of the external tools the drivers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub has_wmctrl: bool,
    pub has_xdotool: bool,
    pub has_qdbus: bool,
    pub has_dbus_send: bool,
    pub has_kdotool: bool,
    pub is_wayland: bool,
    pub is_windows: bool,
    pub desktop: DesktopFamily,
}

impl DependencyReport {
    /// Report for platforms that need no external tooling.
    pub fn windows() -> Self {
        Self {
            has_wmctrl: true,
            has_xdotool: true,
            has_qdbus: true,
            has_dbus_send: true,
            has_kdotool: true,
            is_wayland: false,
            is_windows: true,
            desktop: DesktopFamily::Windows,
        }
    }

    pub fn missing_tools(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.is_windows {
            return missing;
        }
        if !self.has_wmctrl {
            missing.push("wmctrl");
        }
        if !self.has_xdotool {
            missing.push("xdotool");
        }
        if self.desktop == DesktopFamily::Kde && !self.has_qdbus {
            missing.push("qdbus");
        }
        missing
    }

    pub fn install_command(&self) -> String {
        if self.desktop == DesktopFamily::Kde {
            return "sudo apt install wmctrl xdotool qdbus-qt5".to_string();
        }
        let missing = self.missing_tools();
        if missing.is_empty() {
            "sudo apt install wmctrl xdotool".to_string()
        } else {
            format!("sudo apt install {}", missing.join(" "))
        }
    }

    /// Human-readable notes to show before a session starts. Empty when
    /// nothing needs the user's attention.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.is_windows {
            return warnings;
        }

        if !self.missing_tools().is_empty() {
            warnings.push(format!(
                "Missing tools: {}. Install with: {}",
                self.missing_tools().join(", "),
                self.install_command()
            ));
        }

        if self.is_wayland {
            if self.desktop == DesktopFamily::Kde {
                warnings.push(
                    "KDE Plasma on Wayland: windows are controlled through KWin scripting over D-Bus. \
                     If blocking does not work, check that qdbus is installed or log into a Plasma X11 session."
                        .to_string(),
                );
                if !self.has_kdotool {
                    warnings.push(
                        "kdotool is not installed: the focused window is read through xdotool, \
                         which cannot see native Wayland windows. Install kdotool for foreground checks."
                            .to_string(),
                    );
                }
            } else {
                warnings.push(
                    "Wayland session detected: X11 tools cannot see native Wayland windows, so blocking may be limited. \
                     Log into an X11 session or use a desktop extension for focus mode."
                        .to_string(),
                );
            }
        }

        warnings
    }
}
