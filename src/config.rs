use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    pub kde: KdeConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Period of the monitor tick.
    pub interval_ms: u64,
    /// Upper bound for any single window-control command.
    pub command_timeout_ms: u64,
    /// Upper bound for notification commands (PowerShell registry edits are slow).
    pub dnd_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KdeConfig {
    pub script_settle_ms: u64,
    pub caption_max_len: usize,
    pub show_osd: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Allow-list used by `run` when no `--allow` flag is given.
    #[serde(default)]
    pub allowed_apps: Vec<String>,
    /// Additional process/class aliases per display name, merged over the built-in table.
    #[serde(default)]
    pub extra_aliases: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            monitor: MonitorConfig {
                interval_ms: 800,
                command_timeout_ms: 5_000,
                dnd_timeout_ms: 10_000,
            },
            kde: KdeConfig {
                script_settle_ms: 50,
                caption_max_len: 50,
                show_osd: true,
            },
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FOCUSLOCK_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.monitor.interval_ms < 100 {
            anyhow::bail!("monitor.interval_ms must be at least 100");
        }

        if self.monitor.command_timeout_ms == 0 || self.monitor.dnd_timeout_ms == 0 {
            anyhow::bail!("command timeouts must be greater than 0");
        }

        if self.kde.caption_max_len == 0 {
            anyhow::bail!("kde.caption_max_len must be greater than 0");
        }

        for (app, aliases) in &self.session.extra_aliases {
            if aliases.iter().any(|alias| alias.trim().is_empty()) {
                anyhow::bail!("Empty alias configured for '{}'", app);
            }
        }

        Ok(())
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.command_timeout_ms)
    }

    pub fn dnd_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.dnd_timeout_ms)
    }
}
