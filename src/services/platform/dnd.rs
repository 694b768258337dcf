//! Do-not-disturb controllers.
//!
//! Every controller records whether it was the one that switched DND on, so
//! `disable()` never undoes a state the user chose independently.

use crate::services::command_runner::CommandRunner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use zbus::Connection;

use super::qdbus::Qdbus;
use super::r#trait::DndController;

const NOTIFICATIONS_SERVICE: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";

/// Causality flag: set only between a successful enable by this engine and
/// the matching disable.
#[derive(Debug, Default)]
pub struct DndState {
    we_enabled_it: AtomicBool,
}

impl DndState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.we_enabled_it.store(true, Ordering::SeqCst);
    }

    /// Clears the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.we_enabled_it.swap(false, Ordering::SeqCst)
    }

    pub fn is_ours(&self) -> bool {
        self.we_enabled_it.load(Ordering::SeqCst)
    }
}

/// Reads whether notifications are currently inhibited. `None` means the
/// source could not tell.
#[async_trait::async_trait]
pub trait InhibitionSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn is_inhibited(&self) -> Option<bool>;
}

/// Reads the `Inhibited` property over the session bus.
pub struct ZbusInhibitionSource {
    connection: OnceCell<Connection>,
    timeout: Duration,
}

impl ZbusInhibitionSource {
    /// The bus connection is opened on first use. Connecting and reading
    /// together must finish within `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            connection: OnceCell::new(),
            timeout,
        }
    }

    async fn read(&self) -> zbus::Result<bool> {
        let connection = self.connection.get_or_try_init(Connection::session).await?;
        let proxy = zbus::Proxy::new(connection, NOTIFICATIONS_SERVICE, NOTIFICATIONS_PATH, NOTIFICATIONS_SERVICE).await?;
        proxy.get_property::<bool>("Inhibited").await
    }
}

#[async_trait::async_trait]
impl InhibitionSource for ZbusInhibitionSource {
    fn name(&self) -> &'static str {
        "zbus"
    }

    async fn is_inhibited(&self) -> Option<bool> {
        match tokio::time::timeout(self.timeout, self.read()).await {
            Ok(Ok(inhibited)) => Some(inhibited),
            Ok(Err(e)) => {
                debug!("Inhibited property unreadable over D-Bus: {}", e);
                None
            }
            Err(_) => {
                debug!("Reading Inhibited over D-Bus timed out after {:?}", self.timeout);
                None
            }
        }
    }
}

/// Reads the `Inhibited` property through `qdbus`.
pub struct QdbusInhibitionSource {
    qdbus: Arc<Qdbus>,
}

impl QdbusInhibitionSource {
    pub fn new(qdbus: Arc<Qdbus>) -> Self {
        Self { qdbus }
    }
}

#[async_trait::async_trait]
impl InhibitionSource for QdbusInhibitionSource {
    fn name(&self) -> &'static str {
        "qdbus"
    }

    async fn is_inhibited(&self) -> Option<bool> {
        let output = self
            .qdbus
            .call(&[
                NOTIFICATIONS_SERVICE,
                NOTIFICATIONS_PATH,
                "org.freedesktop.Notifications.Inhibited",
            ])
            .await;
        match output.text() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

/// KDE Plasma: toggles DND through the plasmashell global shortcut after
/// checking the notification server's `Inhibited` property.
pub struct KdeDnd {
    qdbus: Arc<Qdbus>,
    sources: Vec<Box<dyn InhibitionSource>>,
    show_osd: bool,
    state: DndState,
}

impl KdeDnd {
    pub fn new(qdbus: Arc<Qdbus>, sources: Vec<Box<dyn InhibitionSource>>, show_osd: bool) -> Self {
        Self {
            qdbus,
            sources,
            show_osd,
            state: DndState::new(),
        }
    }

    /// First conclusive source wins. An unreadable property counts as not
    /// inhibited.
    async fn is_inhibited(&self) -> bool {
        for source in &self.sources {
            if let Some(inhibited) = source.is_inhibited().await {
                debug!("Notifications inhibited = {} ({})", inhibited, source.name());
                return inhibited;
            }
        }
        false
    }

    async fn toggle(&self) -> bool {
        let output = self
            .qdbus
            .call(&[
                "org.kde.kglobalaccel",
                "/component/plasmashell",
                "org.kde.kglobalaccel.Component.invokeShortcut",
                "toggle do not disturb",
            ])
            .await;
        if !output.success {
            warn!("Could not toggle do-not-disturb: {}", output.stderr.trim());
        }
        output.success
    }

    async fn osd(&self, text: &str) {
        if !self.show_osd {
            return;
        }
        let output = self
            .qdbus
            .call(&[
                "org.kde.plasmashell",
                "/org/kde/osdService",
                "org.kde.osdService.showText",
                "notifications-disabled",
                text,
            ])
            .await;
        if !output.success {
            debug!("OSD unavailable: {}", output.stderr.trim());
        }
    }
}

#[async_trait::async_trait]
impl DndController for KdeDnd {
    async fn enable(&self) {
        if self.state.is_ours() {
            return;
        }

        if self.is_inhibited().await {
            info!("Do-not-disturb already active; leaving it as the user set it");
            return;
        }

        if self.toggle().await {
            self.state.mark();
            info!("Do-not-disturb enabled");
            self.osd("Focus mode on").await;
        }
    }

    async fn disable(&self) {
        if !self.state.take() {
            return;
        }

        if self.is_inhibited().await {
            if self.toggle().await {
                info!("Do-not-disturb disabled");
            }
        } else {
            debug!("Do-not-disturb already off");
        }
        self.osd("Focus mode off").await;
    }

    fn we_enabled_it(&self) -> bool {
        self.state.is_ours()
    }
}

/// One command of a preference edit.
#[derive(Debug, Clone, Copy)]
struct PreferenceCommand {
    program: &'static str,
    args: &'static [&'static str],
}

const GNOME_ENABLE: &[PreferenceCommand] = &[PreferenceCommand {
    program: "gsettings",
    args: &["set", "org.gnome.desktop.notifications", "show-banners", "false"],
}];

const GNOME_DISABLE: &[PreferenceCommand] = &[PreferenceCommand {
    program: "gsettings",
    args: &["set", "org.gnome.desktop.notifications", "show-banners", "true"],
}];

/// Focus Assist lives in an opaque CloudStore blob; byte 4 selects the mode
/// (0 off, 2 priority only). The key only exists once Focus Assist has been
/// configured, so a missing key is skipped.
const FOCUS_ASSIST_PRIORITY_ONLY: &str = "$path = 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\CloudStore\\Store\\DefaultAccount\\Current\\default$windows.immersive.notification\\windows.immersive.notification'; \
     if (Test-Path $path) { Set-ItemProperty -Path $path -Name 'Data' -Value ([byte[]](0x00,0x00,0x00,0x00,0x02,0x00,0x00,0x00)) }";

const FOCUS_ASSIST_OFF: &str = "$path = 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\CloudStore\\Store\\DefaultAccount\\Current\\default$windows.immersive.notification\\windows.immersive.notification'; \
     if (Test-Path $path) { Set-ItemProperty -Path $path -Name 'Data' -Value ([byte[]](0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00)) }";

const WINDOWS_ENABLE: &[PreferenceCommand] = &[
    PreferenceCommand {
        program: "powershell",
        args: &[
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            "Set-ItemProperty -Path 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\PushNotifications' -Name 'ToastEnabled' -Value 0 -ErrorAction SilentlyContinue",
        ],
    },
    PreferenceCommand {
        program: "powershell",
        args: &["-NoProfile", "-NonInteractive", "-Command", FOCUS_ASSIST_PRIORITY_ONLY],
    },
];

const WINDOWS_DISABLE: &[PreferenceCommand] = &[
    PreferenceCommand {
        program: "powershell",
        args: &[
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            "Set-ItemProperty -Path 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\PushNotifications' -Name 'ToastEnabled' -Value 1 -ErrorAction SilentlyContinue",
        ],
    },
    PreferenceCommand {
        program: "powershell",
        args: &["-NoProfile", "-NonInteractive", "-Command", FOCUS_ASSIST_OFF],
    },
];

const MACOS_ENABLE: &[PreferenceCommand] = &[
    PreferenceCommand {
        program: "defaults",
        args: &["-currentHost", "write", "com.apple.notificationcenterui", "doNotDisturb", "-boolean", "true"],
    },
    PreferenceCommand {
        program: "killall",
        args: &["NotificationCenter"],
    },
];

const MACOS_DISABLE: &[PreferenceCommand] = &[
    PreferenceCommand {
        program: "defaults",
        args: &["-currentHost", "write", "com.apple.notificationcenterui", "doNotDisturb", "-boolean", "false"],
    },
    PreferenceCommand {
        program: "killall",
        args: &["NotificationCenter"],
    },
];

/// DND through a notification preference edit. There is no pre-check; the
/// preference is written blindly on enable and restored on disable.
pub struct PreferenceDnd {
    runner: Arc<dyn CommandRunner>,
    label: &'static str,
    enable_commands: &'static [PreferenceCommand],
    disable_commands: &'static [PreferenceCommand],
    timeout: Duration,
    state: DndState,
}

impl PreferenceDnd {
    fn new(
        runner: Arc<dyn CommandRunner>,
        label: &'static str,
        enable_commands: &'static [PreferenceCommand],
        disable_commands: &'static [PreferenceCommand],
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            label,
            enable_commands,
            disable_commands,
            timeout,
            state: DndState::new(),
        }
    }

    pub fn gnome(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self::new(runner, "gnome banners", GNOME_ENABLE, GNOME_DISABLE, timeout)
    }

    pub fn windows(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self::new(runner, "windows toasts", WINDOWS_ENABLE, WINDOWS_DISABLE, timeout)
    }

    pub fn macos(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self::new(runner, "macos notification center", MACOS_ENABLE, MACOS_DISABLE, timeout)
    }

    /// Runs every command; `true` if any of them succeeded.
    async fn apply(&self, commands: &[PreferenceCommand]) -> bool {
        let mut any_succeeded = false;
        for command in commands {
            let output = self
                .runner
                .run_with_timeout(command.program, command.args, self.timeout)
                .await;
            if output.success {
                any_succeeded = true;
            } else {
                warn!(
                    "{} failed while updating {}: {}",
                    command.program,
                    self.label,
                    output.stderr.trim()
                );
            }
        }
        any_succeeded
    }
}

#[async_trait::async_trait]
impl DndController for PreferenceDnd {
    async fn enable(&self) {
        if self.state.is_ours() {
            return;
        }
        if self.apply(self.enable_commands).await {
            self.state.mark();
            info!("Do-not-disturb enabled ({})", self.label);
        }
    }

    async fn disable(&self) {
        if !self.state.take() {
            return;
        }
        if self.apply(self.disable_commands).await {
            info!("Do-not-disturb disabled ({})", self.label);
        }
    }

    fn we_enabled_it(&self) -> bool {
        self.state.is_ours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;
    use crate::services::command_runner::CommandOutput;

    struct FixedSource(Option<bool>);

    #[async_trait::async_trait]
    impl InhibitionSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn is_inhibited(&self) -> Option<bool> {
            self.0
        }
    }

    fn kde(runner: Arc<ScriptedRunner>, sources: Vec<Box<dyn InhibitionSource>>) -> KdeDnd {
        KdeDnd::new(Arc::new(Qdbus::new(runner)), sources, false)
    }

    #[test]
    fn test_dnd_state() {
        let state = DndState::new();
        assert!(!state.is_ours());
        assert!(!state.take());
        state.mark();
        assert!(state.is_ours());
        assert!(state.take());
        assert!(!state.is_ours());
    }

    #[tokio::test]
    async fn test_kde_enable_then_disable() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on("qdbus", "invokeShortcut", CommandOutput::ok(""))
            .on_sequence(
                "qdbus",
                "Notifications.Inhibited",
                vec![CommandOutput::ok("false"), CommandOutput::ok("true")],
            );
        let sources: Vec<Box<dyn InhibitionSource>> = vec![Box::new(QdbusInhibitionSource::new(Arc::new(Qdbus::new(
            runner.clone(),
        ))))];
        let dnd = kde(runner.clone(), sources);

        dnd.enable().await;
        assert!(dnd.we_enabled_it());
        dnd.enable().await;
        assert_eq!(runner.count_matching("qdbus", "invokeShortcut"), 1);

        dnd.disable().await;
        assert!(!dnd.we_enabled_it());
        assert_eq!(runner.count_matching("qdbus", "invokeShortcut"), 2);

        dnd.disable().await;
        assert_eq!(runner.count_matching("qdbus", "invokeShortcut"), 2);
    }

    #[tokio::test]
    async fn test_kde_preexisting_dnd_is_left_alone() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("qdbus", "invokeShortcut", CommandOutput::ok(""));
        let dnd = kde(runner.clone(), vec![Box::new(FixedSource(Some(true)))]);

        dnd.enable().await;
        assert!(!dnd.we_enabled_it());
        dnd.disable().await;
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_kde_unreadable_property_means_not_inhibited() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("qdbus", "invokeShortcut", CommandOutput::ok(""));
        let dnd = kde(
            runner.clone(),
            vec![Box::new(FixedSource(None)), Box::new(FixedSource(None))],
        );

        dnd.enable().await;
        assert!(dnd.we_enabled_it());
    }

    #[tokio::test]
    async fn test_kde_first_conclusive_source_wins() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("qdbus", "invokeShortcut", CommandOutput::ok(""));
        let dnd = kde(
            runner.clone(),
            vec![Box::new(FixedSource(None)), Box::new(FixedSource(Some(true)))],
        );

        dnd.enable().await;
        assert!(!dnd.we_enabled_it());
        assert_eq!(runner.count_matching("qdbus", "invokeShortcut"), 0);
    }

    #[tokio::test]
    async fn test_kde_failed_toggle_is_not_recorded() {
        let runner = Arc::new(ScriptedRunner::new());
        let dnd = kde(runner.clone(), vec![Box::new(FixedSource(Some(false)))]);

        dnd.enable().await;
        assert!(!dnd.we_enabled_it());
    }

    #[tokio::test]
    async fn test_kde_disable_skips_toggle_when_user_already_turned_it_off() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("qdbus", "invokeShortcut", CommandOutput::ok(""));
        let dnd = kde(runner.clone(), vec![Box::new(FixedSource(Some(false)))]);

        dnd.enable().await;
        assert!(dnd.we_enabled_it());
        dnd.disable().await;
        assert!(!dnd.we_enabled_it());
        assert_eq!(runner.count_matching("qdbus", "invokeShortcut"), 1);
    }

    #[tokio::test]
    async fn test_gnome_preference() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("gsettings", "show-banners", CommandOutput::ok(""));
        let dnd = PreferenceDnd::gnome(runner.clone(), Duration::from_secs(1));

        dnd.disable().await;
        assert!(runner.calls().is_empty());

        dnd.enable().await;
        dnd.disable().await;
        assert_eq!(
            runner.command_lines(),
            vec![
                "gsettings set org.gnome.desktop.notifications show-banners false".to_string(),
                "gsettings set org.gnome.desktop.notifications show-banners true".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_macos_restarts_notification_center() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("defaults", "doNotDisturb", CommandOutput::ok(""));
        let dnd = PreferenceDnd::macos(runner.clone(), Duration::from_secs(1));

        dnd.enable().await;
        assert!(dnd.we_enabled_it());
        assert_eq!(runner.count_matching("killall", "NotificationCenter"), 1);
    }

    #[tokio::test]
    async fn test_windows_failure_leaves_flag_clear() {
        let runner = Arc::new(ScriptedRunner::new());
        let dnd = PreferenceDnd::windows(runner.clone(), Duration::from_secs(1));

        dnd.enable().await;
        assert!(!dnd.we_enabled_it());
        dnd.disable().await;
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_windows_sets_toasts_and_focus_assist() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("powershell", "Set-ItemProperty", CommandOutput::ok(""));
        let dnd = PreferenceDnd::windows(runner.clone(), Duration::from_secs(1));

        dnd.enable().await;
        assert!(dnd.we_enabled_it());
        let enabled = runner.command_lines();
        assert_eq!(enabled.len(), 2);
        assert!(enabled[0].contains("'ToastEnabled' -Value 0"));
        assert!(enabled[1].contains("CloudStore"));
        assert!(enabled[1].contains("0x02"));

        dnd.disable().await;
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("'ToastEnabled' -Value 1"));
        assert!(lines[3].contains("CloudStore"));
        assert!(!lines[3].contains("0x02"));
    }

    #[tokio::test]
    async fn test_zbus_read_is_bounded() {
        let source = ZbusInhibitionSource::new(Duration::from_millis(200));
        let read = tokio::time::timeout(Duration::from_secs(2), source.is_inhibited()).await;
        assert!(read.is_ok());
    }
}
