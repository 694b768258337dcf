use crate::model::DesktopFamily;

/// Name the engine's own windows and processes carry.
pub const ENGINE_NAME: &str = "focuslock";

/// Shells, compositors and session daemons, never blockable on any platform.
/// Matched as case-insensitive substrings.
const SYSTEM_PROCESSES: &[&str] = &[
    "focuslock",
    "electron",
    "gnome-shell",
    "plasmashell",
    "kwin",
    "kwin_wayland",
    "mutter",
    "xorg",
    "xwayland",
    "wayland",
    "pulseaudio",
    "pipewire",
    "systemd",
    "dbus",
    "polkit",
    "gsd-",
    "gnome-settings",
    "kded",
    "krunner",
    "albert",
    "ulauncher",
    "rofi",
    "dmenu",
    "polybar",
    "waybar",
    "panel",
    "dock",
    "plank",
    "cairo-dock",
    "bridge",
];

/// Windows shell hosts, applied on top of [`SYSTEM_PROCESSES`].
const WINDOWS_SYSTEM_PROCESSES: &[&str] = &[
    "focuslock",
    "electron",
    "explorer",
    "shellexperiencehost",
    "searchhost",
    "startmenuexperiencehost",
    "textinputhost",
    "systemsettings",
    "applicationframehost",
    "runtimebroker",
    "taskhostw",
    "dwm",
    "csrss",
    "winlogon",
    "services",
    "svchost",
    "lsass",
];

/// Window classes of desktop helpers that drivers drop from enumeration
/// outright. Compared for equality, not substring.
const INTERNAL_HELPER_CLASSES: &[&str] = &[
    "xwaylandvideobridge",
    "plasmashell",
    "krunner",
    "gnome-shell",
    "kwin",
    "kwin_wayland",
    "polybar",
    "waybar",
    "plank",
    "pipewire",
    "pulseaudio",
    "org.kde.polkit-kde-authentication-agent-1",
];

/// Platform-specific set of labels that are never blockable.
#[derive(Debug, Clone, Copy)]
pub struct SystemDenylist {
    platform: &'static [&'static str],
}

impl SystemDenylist {
    pub fn for_desktop(desktop: DesktopFamily) -> Self {
        let platform: &'static [&'static str] = match desktop {
            DesktopFamily::Windows => WINDOWS_SYSTEM_PROCESSES,
            _ => &[],
        };
        Self { platform }
    }

    /// `label_lower` must already be lowercased.
    pub fn matches(&self, label_lower: &str) -> bool {
        self.entries().any(|entry| label_lower.contains(entry))
    }

    pub fn entries(&self) -> impl Iterator<Item = &'static str> {
        SYSTEM_PROCESSES.iter().chain(self.platform).copied()
    }
}

/// Whether an enumerated window belongs to the engine or a desktop helper and
/// must not be reported at all.
pub fn is_internal_window(title: &str, class: &str) -> bool {
    let title = title.to_lowercase();
    let class = class.to_lowercase();

    if title.contains(ENGINE_NAME) || class.contains(ENGINE_NAME) {
        return true;
    }

    INTERNAL_HELPER_CLASSES.iter().any(|helper| class == *helper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denylist_per_platform() {
        let linux = SystemDenylist::for_desktop(DesktopFamily::Kde);
        let windows = SystemDenylist::for_desktop(DesktopFamily::Windows);

        assert!(linux.matches("plasmashell"));
        assert!(!linux.matches("explorer"));
        assert!(windows.matches("explorer"));
        assert!(windows.matches("focuslock"));
    }

    #[test]
    fn test_windows_keeps_generic_entries() {
        let windows = SystemDenylist::for_desktop(DesktopFamily::Windows);
        assert!(windows.matches("electron"));
        assert!(windows.matches("gnome-shell"));
        assert!(windows.matches("svchost"));
    }

    #[test]
    fn test_entries_are_lowercase() {
        for desktop in [DesktopFamily::Gnome, DesktopFamily::Windows] {
            for entry in SystemDenylist::for_desktop(desktop).entries() {
                assert_eq!(entry, entry.to_lowercase());
            }
        }
    }

    #[test]
    fn test_internal_windows() {
        assert!(is_internal_window("FocusLock - Session", "focuslock"));
        assert!(is_internal_window("", "xwaylandvideobridge"));
        assert!(is_internal_window("Desktop", "PlasmaShell"));
        assert!(!is_internal_window("Mozilla Firefox", "firefox"));
        // Substrings of helper classes are not dropped.
        assert!(!is_internal_window("Notes", "kwinfo"));
    }
}
