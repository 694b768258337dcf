use crate::services::command_runner::{CommandOutput, CommandRunner};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Binary names qdbus ships under, newest Plasma first.
pub const QDBUS_CANDIDATES: &[&str] = &["qdbus6", "qdbus-qt6", "qdbus", "qdbus-qt5"];

/// `qdbus` invoker that resolves the installed binary name on first use.
pub struct Qdbus {
    runner: Arc<dyn CommandRunner>,
    program: OnceCell<&'static str>,
}

impl Qdbus {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: OnceCell::new(),
        }
    }

    async fn program(&self) -> &'static str {
        self.program
            .get_or_init(|| async {
                for candidate in QDBUS_CANDIDATES {
                    if self.runner.is_available(candidate).await {
                        debug!("Using {} for D-Bus calls", candidate);
                        return *candidate;
                    }
                }
                "qdbus"
            })
            .await
    }

    pub async fn call(&self, args: &[&str]) -> CommandOutput {
        let program = self.program().await;
        self.runner.run(program, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;

    #[tokio::test]
    async fn test_prefers_qt6_binary() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.with_available(&["qdbus-qt5", "qdbus6"]);
        runner.on("qdbus6", "/KWin", CommandOutput::ok("ok"));

        let qdbus = Qdbus::new(runner.clone());
        assert!(qdbus.call(&["org.kde.KWin", "/KWin", "reconfigure"]).await.success);
        assert_eq!(runner.count_matching("qdbus6", "reconfigure"), 1);
    }

    #[tokio::test]
    async fn test_defaults_to_plain_qdbus() {
        let runner = Arc::new(ScriptedRunner::new());
        let qdbus = Qdbus::new(runner.clone());
        qdbus.call(&["org.kde.KWin"]).await;
        assert_eq!(runner.calls()[0].0, "qdbus");
    }
}
