//! Leaf executor for external OS commands.
//!
//! Every invocation carries a timeout and is reported back as a
//! [`CommandOutput`]; spawn errors, non-zero exits and timeouts all come back
//! as `success == false` so callers can move on to the next fallback.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::trace_if_enabled;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stdout of a successful run, `None` on failure or empty output.
    pub fn text(&self) -> Option<&str> {
        let text = self.stdout.trim();
        if self.success && !text.is_empty() {
            Some(text)
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput;

    fn default_timeout(&self) -> Duration;

    async fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
        self.run_with_timeout(program, args, self.default_timeout()).await
    }

    /// Whether `program` can be found on the search path.
    async fn is_available(&self, program: &str) -> bool {
        let locator = if cfg!(windows) { "where" } else { "which" };
        self.run(locator, &[program]).await.success
    }
}

/// Runs commands through `tokio::process`.
pub struct SystemCommandRunner {
    timeout: Duration,
    env_overrides: HashMap<String, String>,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            env_overrides: build_env_overrides(),
        }
    }
}

/// When started through sudo, point desktop tools back at the invoking user's
/// session bus and display.
fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = std::process::Command::new("id").args(["-u", &sudo_user]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    if !uid.is_empty() {
                        let user_runtime_dir = format!("/run/user/{}", uid);
                        let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                        debug!("Targeting session of {} (uid={})", sudo_user, uid);
                        env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                        env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                        env_vars.insert("USER".to_string(), sudo_user);
                    }
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &self.env_overrides {
            cmd.env(key, value);
        }

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        trace_if_enabled!("exec {} {:?}", program, args);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Could not spawn {}: {}", program, e);
                return CommandOutput::failed(e.to_string());
            }
            Err(_) => {
                debug!("{} timed out after {}ms", program, timeout.as_millis());
                return CommandOutput::failed(format!("timed out after {}ms", timeout.as_millis()));
            }
        };

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success {
            debug!("{} exited with {}: {}", program, output.status, result.stderr.trim());
        }

        result
    }

    fn default_timeout(&self) -> Duration {
        self.timeout
    }
}
