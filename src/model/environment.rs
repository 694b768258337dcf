use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesktopFamily {
    Kde,
    Gnome,
    Xfce,
    Other,
    Windows,
    MacOs,
}

impl DesktopFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesktopFamily::Kde => "kde",
            DesktopFamily::Gnome => "gnome",
            DesktopFamily::Xfce => "xfce",
            DesktopFamily::Other => "other",
            DesktopFamily::Windows => "windows",
            DesktopFamily::MacOs => "macos",
        }
    }
}

impl fmt::Display for DesktopFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub desktop: DesktopFamily,
    pub is_wayland: bool,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            desktop: DesktopFamily::Other,
            is_wayland: false,
        }
    }
}

impl fmt::Display for EnvironmentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = if self.is_wayland { "wayland" } else { "x11" };
        write!(f, "{} ({})", self.desktop, protocol)
    }
}
