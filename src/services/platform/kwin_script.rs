//! Scoped KWin script: written to disk and loaded on acquire, unloaded and
//! deleted on release. Dropping an unreleased script still removes the file
//! and schedules the unload.

use crate::error::{FocusError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::qdbus::Qdbus;

const KWIN_SERVICE: &str = "org.kde.KWin";
const SCRIPTING_PATH: &str = "/Scripting";

static SCRIPT_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct KwinScript {
    qdbus: Arc<Qdbus>,
    path: PathBuf,
    plugin_name: String,
    released: bool,
}

impl KwinScript {
    /// Write `source` to a temporary file and load it into KWin.
    pub async fn load(qdbus: Arc<Qdbus>, source: &str) -> Result<Self> {
        let n = SCRIPT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let plugin_name = format!("focuslock_min_{}_{}", std::process::id(), n);
        let path = std::env::temp_dir().join(format!("{}.js", plugin_name));

        tokio::fs::write(&path, source).await?;

        // From here on the guard owns the file.
        let mut script = Self {
            qdbus,
            path,
            plugin_name,
            released: false,
        };

        let path_arg = script.path.to_string_lossy().into_owned();
        let output = script
            .qdbus
            .call(&[
                KWIN_SERVICE,
                SCRIPTING_PATH,
                "org.kde.kwin.Scripting.loadScript",
                &path_arg,
                &script.plugin_name,
            ])
            .await;

        match output.text() {
            Some(id) if id != "-1" => {
                debug!("Loaded KWin script {} as #{}", script.plugin_name, id);
                Ok(script)
            }
            _ => {
                let detail = output.stderr.trim().to_string();
                script.remove_file().await;
                script.released = true;
                Err(FocusError::command_failed("qdbus loadScript", detail))
            }
        }
    }

    /// Ask KWin to start every loaded script, then give it `settle` to act.
    pub async fn run(&self, settle: Duration) -> bool {
        let output = self
            .qdbus
            .call(&[KWIN_SERVICE, SCRIPTING_PATH, "org.kde.kwin.Scripting.start"])
            .await;
        if !output.success {
            debug!("KWin Scripting.start failed: {}", output.stderr.trim());
            return false;
        }
        tokio::time::sleep(settle).await;
        true
    }

    pub async fn release(mut self) {
        self.unload().await;
        self.remove_file().await;
        self.released = true;
    }

    async fn unload(&self) {
        let output = self
            .qdbus
            .call(&[
                KWIN_SERVICE,
                SCRIPTING_PATH,
                "org.kde.kwin.Scripting.unloadScript",
                &self.plugin_name,
            ])
            .await;
        if !output.success {
            debug!("Could not unload KWin script {}: {}", self.plugin_name, output.stderr.trim());
        }
    }

    async fn remove_file(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Could not remove {:?}: {}", self.path, e);
            }
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for KwinScript {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let _ = std::fs::remove_file(&self.path);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let qdbus = self.qdbus.clone();
            let plugin_name = self.plugin_name.clone();
            handle.spawn(async move {
                qdbus
                    .call(&[
                        KWIN_SERVICE,
                        SCRIPTING_PATH,
                        "org.kde.kwin.Scripting.unloadScript",
                        &plugin_name,
                    ])
                    .await;
            });
        }
    }
}

/// Escape and shorten a caption so it can sit inside a single-quoted JS
/// string. Control characters are dropped.
pub fn sanitize_caption(caption: &str, max_len: usize) -> String {
    let mut sanitized = String::new();
    for c in caption.chars().filter(|c| !c.is_control()).take(max_len) {
        match c {
            '\\' => sanitized.push_str("\\\\"),
            '\'' => sanitized.push_str("\\'"),
            '"' => sanitized.push_str("\\\""),
            _ => sanitized.push(c),
        }
    }
    sanitized
}

/// Script that minimizes every client whose caption contains `fragment`.
/// `fragment` must already be sanitized.
pub fn minimize_script(fragment: &str) -> String {
    format!(
        r#"(function() {{
    var clients = workspace.windowList ? workspace.windowList() : workspace.clientList();
    for (var i = 0; i < clients.length; i++) {{
        var c = clients[i];
        var name = c.caption || '';
        if (name.indexOf('{fragment}') !== -1) {{
            c.minimized = true;
        }}
    }}
}})();
"#,
        fragment = fragment
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::mock::ScriptedRunner;
    use crate::services::command_runner::CommandOutput;

    #[test]
    fn test_sanitize_caption() {
        assert_eq!(sanitize_caption("it's \"done\"", 50), "it\\'s \\\"done\\\"");
        assert_eq!(sanitize_caption("a\\b", 50), "a\\\\b");
        assert_eq!(sanitize_caption("line\nbreak", 50), "linebreak");
        assert_eq!(sanitize_caption("ééééé", 3), "ééé");
    }

    #[test]
    fn test_truncation_happens_before_escaping() {
        assert_eq!(sanitize_caption("ab'cd", 3), "ab\\'");
    }

    #[test]
    fn test_minimize_script_embeds_fragment() {
        let script = minimize_script("Mozilla Firefox");
        assert!(script.contains("name.indexOf('Mozilla Firefox')"));
        assert!(script.contains("c.minimized = true"));
    }

    #[tokio::test]
    async fn test_load_run_release() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on("qdbus", "loadScript", CommandOutput::ok("3\n"))
            .on("qdbus", "Scripting.start", CommandOutput::ok(""))
            .on("qdbus", "unloadScript", CommandOutput::ok("true"));
        let qdbus = Arc::new(Qdbus::new(runner.clone()));

        let script = KwinScript::load(qdbus, "// test").await.unwrap();
        let path = script.path().to_path_buf();
        assert!(path.exists());

        assert!(script.run(Duration::from_millis(1)).await);
        script.release().await;

        assert!(!path.exists());
        assert_eq!(runner.count_matching("qdbus", "unloadScript"), 1);
    }

    #[tokio::test]
    async fn test_failed_load_cleans_up() {
        let runner = Arc::new(ScriptedRunner::new());
        let qdbus = Arc::new(Qdbus::new(runner.clone()));

        assert!(KwinScript::load(qdbus, "// test").await.is_err());
        assert_eq!(runner.count_matching("qdbus", "unloadScript"), 0);
    }

    #[tokio::test]
    async fn test_drop_without_release_removes_file() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("qdbus", "loadScript", CommandOutput::ok("4"));
        let qdbus = Arc::new(Qdbus::new(runner.clone()));

        let script = KwinScript::load(qdbus, "// test").await.unwrap();
        let path = script.path().to_path_buf();
        drop(script);

        assert!(!path.exists());
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(runner.count_matching("qdbus", "unloadScript"), 1);
    }
}
