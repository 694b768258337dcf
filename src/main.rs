use anyhow::Result;
use clap::{Parser, Subcommand};
use focuslock::{AllowList, Config, SessionEngine};
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "focuslock")]
#[command(about = "Minimizes every window outside an allow-list and silences notifications during a focus session")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "focuslock.toml")]
    config: String,

    /// Log actions instead of touching the desktop
    #[arg(long)]
    dry_run: bool,

    /// Log level, overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a focus session and block until Ctrl+C or the duration elapses
    Run {
        /// Application allowed to stay visible (repeatable)
        #[arg(short, long = "allow")]
        allow: Vec<String>,

        /// Session length in minutes
        #[arg(short, long)]
        minutes: Option<u64>,
    },
    /// Report which window-control tools are installed
    CheckDeps {
        #[arg(long)]
        json: bool,
    },
    /// Check whether the selected driver can list windows
    TestWindowControl,
    /// Print open windows and whether an allow-list would keep them
    ListWindows {
        #[arg(short, long = "allow")]
        allow: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config.logging.level, &config.logging.format)?;

    info!("Starting FocusLock v{}", env!("CARGO_PKG_VERSION"));

    if args.dry_run {
        warn!("Dry run: the desktop will not be touched");
    }

    let engine = SessionEngine::from_config(&config, args.dry_run);
    info!("Desktop: {} (driver: {})", engine.environment(), engine.driver_name());

    match args.command {
        Command::Run { allow, minutes } => {
            let apps = if allow.is_empty() {
                config.session.allowed_apps.clone()
            } else {
                allow
            };
            let shutdown = shutdown_signal(session_length(minutes));
            engine
                .run_until(AllowList::new(apps), shutdown, SHUTDOWN_TIMEOUT)
                .await;
        }
        Command::CheckDeps { json } => {
            let report = engine.check_dependencies().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("desktop:   {}", report.desktop);
                println!("wayland:   {}", report.is_wayland);
                println!("wmctrl:    {}", report.has_wmctrl);
                println!("xdotool:   {}", report.has_xdotool);
                println!("qdbus:     {}", report.has_qdbus);
                println!("dbus-send: {}", report.has_dbus_send);
                println!("kdotool:   {}", report.has_kdotool);
                for warning in report.warnings() {
                    println!("warning: {}", warning);
                }
            }
        }
        Command::TestWindowControl => {
            let works = engine.test_window_control().await;
            println!("window control {}", if works { "works" } else { "unavailable" });
            if !works {
                std::process::exit(1);
            }
        }
        Command::ListWindows { allow } => {
            let allow_list = AllowList::new(allow);
            for (window, allowed) in engine.list_windows(&allow_list).await? {
                println!("{} {}", if allowed { "allow" } else { "block" }, window);
            }
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or when the session length elapses.
async fn shutdown_signal(length: Option<Duration>) {
    let deadline = async {
        match length {
            Some(length) => tokio::time::sleep(length).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C"),
            Err(err) => error!("Could not wait for Ctrl+C: {}", err),
        },
        _ = deadline => info!("Session time is up"),
    }
}

fn session_length(minutes: Option<u64>) -> Option<Duration> {
    minutes.map(|m| Duration::from_secs(m.saturating_mul(60)))
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_length() {
        assert_eq!(session_length(None), None);
        assert_eq!(session_length(Some(25)), Some(Duration::from_secs(1500)));
        assert_eq!(session_length(Some(u64::MAX)), Some(Duration::from_secs(u64::MAX)));
    }
}
