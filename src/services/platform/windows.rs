use crate::error::{FocusError, Result};
use crate::mappings::system_processes::is_internal_window;
use crate::model::WindowRecord;
use crate::services::command_runner::{CommandOutput, CommandRunner};
use std::sync::Arc;
use tracing::{debug, warn};

use super::r#trait::WindowDriver;

const POWERSHELL: &str = "powershell";
const POWERSHELL_ARGS: &[&str] = &["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command"];

/// user32 helper compiled into the PowerShell session. Each window is printed
/// as `handle|title|process`.
const WINDOW_HELPER: &str = r#"Add-Type @"
using System;
using System.Collections.Generic;
using System.Diagnostics;
using System.Runtime.InteropServices;
using System.Text;
public class FocusLockWindows {
    private delegate bool EnumWindowsProc(IntPtr hWnd, IntPtr lParam);
    [DllImport("user32.dll")] private static extern bool EnumWindows(EnumWindowsProc cb, IntPtr lParam);
    [DllImport("user32.dll")] private static extern int GetWindowText(IntPtr hWnd, StringBuilder s, int n);
    [DllImport("user32.dll")] private static extern bool IsWindowVisible(IntPtr hWnd);
    [DllImport("user32.dll")] private static extern uint GetWindowThreadProcessId(IntPtr hWnd, out uint pid);
    [DllImport("user32.dll")] private static extern IntPtr GetForegroundWindow();
    [DllImport("user32.dll")] public static extern bool ShowWindow(IntPtr hWnd, int nCmdShow);
    private static string Describe(IntPtr hWnd) {
        StringBuilder title = new StringBuilder(256);
        GetWindowText(hWnd, title, 256);
        if (title.Length == 0) return null;
        uint pid;
        GetWindowThreadProcessId(hWnd, out pid);
        string name = "unknown";
        try { name = Process.GetProcessById((int)pid).ProcessName; } catch { }
        return hWnd.ToString() + "|" + title.ToString() + "|" + name;
    }
    public static List<string> Visible() {
        List<string> found = new List<string>();
        EnumWindows((hWnd, lParam) => {
            if (IsWindowVisible(hWnd)) {
                string line = Describe(hWnd);
                if (line != null) found.Add(line);
            }
            return true;
        }, IntPtr.Zero);
        return found;
    }
    public static string Foreground() {
        IntPtr hWnd = GetForegroundWindow();
        if (hWnd == IntPtr.Zero) return "";
        return Describe(hWnd) ?? "";
    }
}
"@
"#;

/// SW_MINIMIZE
const SW_MINIMIZE: i32 = 6;

/// Windows driver. Talks to user32 through PowerShell.
pub struct WindowsDriver {
    runner: Arc<dyn CommandRunner>,
}

impl WindowsDriver {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn powershell(&self, script: &str) -> CommandOutput {
        let mut args: Vec<&str> = POWERSHELL_ARGS.to_vec();
        args.push(script);
        self.runner.run(POWERSHELL, &args).await
    }
}

#[async_trait::async_trait]
impl WindowDriver for WindowsDriver {
    fn name(&self) -> &'static str {
        "windows"
    }

    async fn enumerate(&self) -> Result<Vec<WindowRecord>> {
        let script = format!("{}[FocusLockWindows]::Visible() | ForEach-Object {{ Write-Output $_ }}", WINDOW_HELPER);
        let output = self.powershell(&script).await;
        if !output.success {
            warn!("Could not list windows: {}", output.stderr.trim());
            return Err(FocusError::command_failed(POWERSHELL, output.stderr.trim()));
        }
        Ok(output.stdout.lines().filter_map(parse_window_line).collect())
    }

    async fn active_window(&self) -> Option<WindowRecord> {
        let script = format!("{}Write-Output ([FocusLockWindows]::Foreground())", WINDOW_HELPER);
        let output = self.powershell(&script).await;
        parse_window_line(output.text()?)
    }

    async fn minimize(&self, window: &WindowRecord) -> bool {
        let Ok(handle) = window.id.trim().parse::<i64>() else {
            debug!("Cannot minimize '{}': bad handle {}", window.title, window.id);
            return false;
        };

        let script = format!(
            "{}[void][FocusLockWindows]::ShowWindow([IntPtr]{}, {})",
            WINDOW_HELPER, handle, SW_MINIMIZE
        );
        let output = self.powershell(&script).await;
        if !output.success {
            debug!("ShowWindow failed for '{}': {}", window.title, output.stderr.trim());
        }
        output.success
    }
}

/// Parses one `handle|title|process` line. Titles may contain `|`, so the
/// handle is taken before the first separator and the process after the last.
pub fn parse_window_line(line: &str) -> Option<WindowRecord> {
    let line = line.trim();
    let (handle, rest) = line.split_once('|')?;
    let (title, process) = rest.rsplit_once('|')?;

    let handle = handle.trim();
    let title = title.trim();
    let process = process.trim();
    if handle.is_empty() || title.is_empty() || is_internal_window(title, process) {
        return None;
    }

    Some(WindowRecord::new(handle, title).with_process(process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;

    #[test]
    fn test_parse_window_line() {
        let window = parse_window_line("394822|Inbox | Mail - Outlook|OUTLOOK\r").unwrap();
        assert_eq!(window.id, "394822");
        assert_eq!(window.title, "Inbox | Mail - Outlook");
        assert_eq!(window.process_name, "OUTLOOK");

        assert!(parse_window_line("").is_none());
        assert!(parse_window_line("123|no process").is_none());
        assert!(parse_window_line("123||explorer").is_none());
        assert!(parse_window_line("55|FocusLock|focuslock").is_none());
    }

    #[tokio::test]
    async fn test_enumerate() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(
            "powershell",
            "]::Visible()",
            CommandOutput::ok("1001|Untitled - Notepad|notepad\r\n2002|Spotify Premium|Spotify\r\n"),
        );

        let windows = WindowsDriver::new(runner).enumerate().await.unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].process_name, "Spotify");
    }

    #[tokio::test]
    async fn test_enumerate_failure() {
        let runner = Arc::new(ScriptedRunner::new());
        assert!(WindowsDriver::new(runner).enumerate().await.is_err());
    }

    #[tokio::test]
    async fn test_active_window() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("powershell", "]::Foreground()", CommandOutput::ok("77|Discord|Discord\r\n"));

        let window = WindowsDriver::new(runner).active_window().await.unwrap();
        assert_eq!(window.id, "77");
    }

    #[tokio::test]
    async fn test_minimize() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("powershell", "ShowWindow([IntPtr]394822, 6)", CommandOutput::ok("True"));
        let driver = WindowsDriver::new(runner.clone());

        assert!(driver.minimize(&WindowRecord::new("394822", "Inbox")).await);
        assert!(!driver.minimize(&WindowRecord::new("0x1f", "Inbox")).await);
        assert_eq!(runner.calls().len(), 1);
    }
}
