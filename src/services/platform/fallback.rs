use crate::services::command_runner::CommandRunner;
use smallvec::SmallVec;
use tracing::debug;

use crate::debug_if_enabled;

/// One command in an ordered fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackStep {
    pub label: &'static str,
    pub program: &'static str,
    pub args: Vec<String>,
}

impl FallbackStep {
    fn new(label: &'static str, program: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            program,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Ordered mechanisms tried until one succeeds.
#[derive(Debug, Clone, Default)]
pub struct FallbackChain {
    steps: SmallVec<[FallbackStep; 4]>,
}

impl FallbackChain {
    pub fn steps(&self) -> &[FallbackStep] {
        &self.steps
    }

    /// Runs the steps in order and stops at the first success. Returns the
    /// label of the step that succeeded.
    pub async fn run(&self, runner: &dyn CommandRunner) -> Option<&'static str> {
        for step in &self.steps {
            let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
            let output = runner.run(step.program, &args).await;
            if output.success {
                debug_if_enabled!("Fallback step '{}' succeeded", step.label);
                return Some(step.label);
            }
            debug!("Fallback step '{}' failed: {}", step.label, output.stderr.trim());
        }
        None
    }
}

impl FromIterator<FallbackStep> for FallbackChain {
    fn from_iter<I: IntoIterator<Item = FallbackStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Normalizes an X11 window id to the `0x…` form wmctrl and xdotool accept.
/// Decimal ids (as printed by `xdotool search`) are converted.
pub fn to_hex_window_id(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    if let Some(hex) = id.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).ok().map(|_| id.to_string());
    }
    if let Ok(decimal) = id.parse::<u64>() {
        return Some(format!("0x{:08x}", decimal));
    }
    u64::from_str_radix(id, 16).ok().map(|_| format!("0x{}", id))
}

/// One spelling per X11 window, so `0x4000003`, `0x04000003` and `67108867`
/// compare equal.
pub fn canonical_x11_id(id: &str) -> Option<String> {
    let hex = to_hex_window_id(id)?;
    let number = u64::from_str_radix(hex.strip_prefix("0x")?, 16).ok()?;
    Some(format!("0x{:08x}", number))
}

/// Minimize chain for plain X11 tooling: minimize, close, hide, then
/// activate-and-minimize.
pub fn x11_minimize_chain(hex_id: &str) -> FallbackChain {
    [
        FallbackStep::new("xdotool-minimize", "xdotool", &["windowminimize", hex_id]),
        FallbackStep::new("wmctrl-close", "wmctrl", &["-i", "-c", hex_id]),
        FallbackStep::new("wmctrl-hidden", "wmctrl", &["-i", "-r", hex_id, "-b", "add,hidden"]),
        FallbackStep::new(
            "xdotool-activate-minimize",
            "xdotool",
            &["windowactivate", "--sync", hex_id, "windowminimize", hex_id],
        ),
    ]
    .into_iter()
    .collect()
}
