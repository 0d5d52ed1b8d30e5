//! Tunnel Monitor CLI - terminal front-end for a tunnel daemon

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunnelmon_api::Settings;
use tunnelmon_client::{
    ActionController, ApiClient, ConnectionChannel, LogBuffer, Monitor, MonitorOptions, Poller,
    PollerConfig, DASHBOARD_CAP, PAGE_CAP,
};

mod config;
mod render;

use config::{CliConfig, ConfigManager};
use render::{parse_log_level, render_dashboard, render_logs, render_settings};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Tunnel Monitor - watch and control a tunnel daemon
#[derive(Parser, Debug)]
#[command(name = "tunnelmon")]
#[command(about = "Monitor and control a tunnel daemon", long_about = None)]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the daemon control API
    #[arg(long, env = "TUNNELMON_BASE_URL")]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Live dashboard: status, URL, uptime, latency and recent activity
    Dashboard {
        /// Render interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
        /// Poll latency every second instead of every five
        #[arg(long)]
        fast_ping: bool,
    },
    /// Show or follow daemon logs
    Logs {
        /// Keep pulling new entries until interrupted
        #[arg(short, long)]
        follow: bool,
        /// Only show entries at this level (info, success, warning, error, debug)
        #[arg(short, long)]
        level: Option<String>,
        /// Write the retained entries to a timestamped file instead of stdout
        #[arg(long)]
        export: bool,
        /// Clear logs on the daemon (and locally) first
        #[arg(long)]
        clear: bool,
    },
    /// Inspect or change daemon settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Show or persist CLI defaults (~/.tunnelmon/config.json)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Start the tunnel
    Start,
    /// Stop the tunnel
    Stop,
    /// Send a test notification (daemons with notifications only)
    TestNotification,
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// Print the current settings record
    Show,
    /// Change one field and submit the whole record
    Set {
        /// Field name (e.g. check_interval)
        key: String,
        /// New value
        value: String,
    },
    /// Reset all settings to daemon defaults
    Reset,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the persisted CLI configuration
    Show,
    /// Persist one field (base_url, fast_ping)
    Set {
        /// Field name
        key: String,
        /// New value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_config = ConfigManager::load().unwrap_or_default();

    // Config management needs no daemon, and must work with a broken saved URL
    let command = match cli.command {
        Commands::Config { command } => return run_config(&file_config, command),
        other => other,
    };

    let base_url = cli
        .base_url
        .or(file_config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    debug!("Using daemon at {}", base_url);

    let client = ApiClient::new(&base_url).context("Invalid daemon base URL")?;

    match command {
        Commands::Dashboard {
            interval,
            fast_ping,
        } => run_dashboard(client, interval, fast_ping || file_config.fast_ping).await,
        Commands::Logs {
            follow,
            level,
            export,
            clear,
        } => run_logs(client, follow, level, export, clear).await,
        Commands::Settings { command } => run_settings(client, command).await,
        Commands::Config { .. } => unreachable!("handled before client construction"),
        Commands::Start => run_action(client, ActionTarget::Start).await,
        Commands::Stop => run_action(client, ActionTarget::Stop).await,
        Commands::TestNotification => run_action(client, ActionTarget::TestNotification).await,
    }
}

/// Wire up the full monitor (poller + push channel) and render forever
async fn run_dashboard(client: ApiClient, interval: u64, fast_ping: bool) -> Result<()> {
    let monitor = Monitor::new(MonitorOptions {
        log_cap: DASHBOARD_CAP,
        notifications: true,
    });

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let events_url = client.events_url().context("Cannot derive events URL")?;
    ConnectionChannel::new(events_url).spawn(tx.clone());

    let poll_config = if fast_ping {
        PollerConfig::ping_page()
    } else {
        PollerConfig::default()
    };
    Poller::new(client, poll_config).spawn(tx);

    {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.run(rx).await });
    }

    // Repaint on state changes, and at least once per interval
    let mut revision = monitor.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    loop {
        tokio::select! {
            _ = revision.changed() => {}
            _ = ticker.tick() => {}
        }
        let snap = monitor.snapshot().await;
        // Clear screen and repaint from the home position
        print!("\x1b[2J\x1b[H{}", render_dashboard(&snap));
    }
}

async fn run_logs(
    client: ApiClient,
    follow: bool,
    level: Option<String>,
    export: bool,
    clear: bool,
) -> Result<()> {
    let level = level
        .as_deref()
        .map(parse_log_level)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    if clear {
        let monitor = Monitor::new(MonitorOptions::default());
        let controller = ActionController::new(client.clone(), monitor);
        controller
            .clear_logs()
            .await
            .context("Failed to clear logs")?;
        println!("Logs cleared");
    }

    // The daemon drains its buffer on every pull, so the page keeps its own
    // retained buffer; filter and export read from it, not the wire
    let mut buffer = LogBuffer::new(PAGE_CAP);
    let batch = client.logs().await.context("Failed to fetch logs")?;
    buffer.ingest(batch);

    if export {
        let name = render::export_filename(&chrono::Local::now());
        std::fs::write(&name, buffer.export()).context("Failed to write export file")?;
        println!("Exported {} entries to {}", buffer.len(), name);
        return Ok(());
    }

    if !follow {
        let text = render_logs(buffer.filtered(level));
        if !text.is_empty() {
            println!("{}", text);
        }
        return Ok(());
    }

    // Repaint the retained buffer on every pull, like the live logs page
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    ticker.tick().await;
    loop {
        print!("\x1b[2J\x1b[H{}\n", render_logs(buffer.filtered(level)));
        ticker.tick().await;
        match client.logs().await {
            Ok(batch) => buffer.ingest(batch),
            Err(e) => tracing::warn!("Log poll failed: {}", e),
        }
    }
}

async fn run_settings(client: ApiClient, command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = client.settings().await.context("Failed to load settings")?;
            print!("{}", render_settings(&settings));
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            let mut settings = client.settings().await.context("Failed to load settings")?;
            apply_setting(&mut settings, &key, &value).map_err(anyhow::Error::msg)?;

            let monitor = Monitor::new(MonitorOptions::default());
            let controller = ActionController::new(client, monitor.clone());
            controller.save_settings(settings).await;
            report_alerts(&monitor).await
        }
        SettingsCommands::Reset => {
            let monitor = Monitor::new(MonitorOptions::default());
            let controller = ActionController::new(client, monitor.clone());
            controller.reset_settings().await;
            report_alerts(&monitor).await
        }
    }
}

fn run_config(config: &CliConfig, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!(
                "base_url  = {}",
                config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
            );
            println!("fast_ping = {}", config.fast_ping);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut updated = config.clone();
            apply_cli_setting(&mut updated, &key, &value).map_err(anyhow::Error::msg)?;
            ConfigManager::save(&updated)?;
            println!("Saved {}", key);
            Ok(())
        }
    }
}

/// Apply one `key value` change onto the persisted CLI configuration
fn apply_cli_setting(config: &mut CliConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "base_url" => config.base_url = Some(value.to_string()),
        "fast_ping" => {
            config.fast_ping = value
                .parse::<bool>()
                .map_err(|_| "fast_ping must be true or false".to_string())?
        }
        other => return Err(format!("unknown config key: {}", other)),
    }
    Ok(())
}

enum ActionTarget {
    Start,
    Stop,
    TestNotification,
}

async fn run_action(client: ApiClient, target: ActionTarget) -> Result<()> {
    let monitor = Monitor::new(MonitorOptions::default());
    let controller = ActionController::new(client, monitor.clone());

    match target {
        ActionTarget::Start => controller.start().await,
        ActionTarget::Stop => controller.stop().await,
        ActionTarget::TestNotification => controller.test_notification().await,
    };

    report_alerts(&monitor).await
}

/// Print the outcome alerts of a one-shot action; error severity becomes a
/// non-zero exit
async fn report_alerts(monitor: &Monitor) -> Result<()> {
    let snap = monitor.snapshot().await;
    let mut failed = false;

    for alert in &snap.alerts {
        println!("[{:?}] {}", alert.severity, alert.message);
        failed |= alert.severity == tunnelmon_api::AlertSeverity::Error;
    }

    if failed {
        anyhow::bail!("daemon reported an error");
    }
    Ok(())
}

/// Apply one `key=value` style change onto the settings record
fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<(), String> {
    let parse_u64 =
        |v: &str| v.parse::<u64>().map_err(|_| format!("{} must be a number", key));
    let parse_bool =
        |v: &str| v.parse::<bool>().map_err(|_| format!("{} must be true or false", key));

    match key {
        "tunnel_url" => settings.tunnel_url = value.to_string(),
        "check_interval" => settings.check_interval = parse_u64(value)?,
        "max_retries" => {
            settings.max_retries = value
                .parse::<u32>()
                .map_err(|_| format!("{} must be a number", key))?
        }
        "retry_delay" => settings.retry_delay = parse_u64(value)?,
        "debug_mode" => settings.debug_mode = parse_bool(value)?,
        "whatsapp_contact" => settings.whatsapp_contact = Some(value.to_string()),
        "message_template" => settings.message_template = Some(value.to_string()),
        "chrome_path" => settings.chrome_path = Some(value.to_string()),
        "cloudflared_path" => settings.cloudflared_path = Some(value.to_string()),
        "headless_mode" => settings.headless_mode = Some(parse_bool(value)?),
        other => return Err(format!("unknown setting: {}", other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            tunnel_url: "http://localhost:8096".to_string(),
            check_interval: 30,
            max_retries: 3,
            retry_delay: 5,
            debug_mode: false,
            whatsapp_contact: None,
            message_template: None,
            chrome_path: None,
            cloudflared_path: None,
            headless_mode: None,
        }
    }

    #[test]
    fn test_apply_setting_parses_types() {
        let mut s = settings();
        apply_setting(&mut s, "check_interval", "10").unwrap();
        assert_eq!(s.check_interval, 10);

        apply_setting(&mut s, "debug_mode", "true").unwrap();
        assert!(s.debug_mode);

        apply_setting(&mut s, "cloudflared_path", "/usr/local/bin/cloudflared").unwrap();
        assert_eq!(
            s.cloudflared_path.as_deref(),
            Some("/usr/local/bin/cloudflared")
        );
    }

    #[test]
    fn test_apply_setting_rejects_bad_input() {
        let mut s = settings();
        assert!(apply_setting(&mut s, "check_interval", "soon").is_err());
        assert!(apply_setting(&mut s, "debug_mode", "yes").is_err());
        assert!(apply_setting(&mut s, "no_such_key", "1").is_err());
    }

    #[test]
    fn test_apply_cli_setting() {
        let mut config = CliConfig::default();
        apply_cli_setting(&mut config, "base_url", "http://10.0.0.2:5000").unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://10.0.0.2:5000"));

        apply_cli_setting(&mut config, "fast_ping", "true").unwrap();
        assert!(config.fast_ping);

        assert!(apply_cli_setting(&mut config, "fast_ping", "yes").is_err());
        assert!(apply_cli_setting(&mut config, "no_such_key", "1").is_err());
    }

    #[test]
    fn test_logs_page_retains_drained_pulls() {
        use tunnelmon_api::{LogEntry, LogLevel};

        // The daemon drains per pull; the page buffer must accumulate so
        // filter and export see every pulled entry
        let mut buffer = LogBuffer::new(PAGE_CAP);
        buffer.ingest(vec![LogEntry {
            timestamp: "2024-01-01 12:00:00".to_string(),
            level: LogLevel::Info,
            message: "Checking tunnel".to_string(),
        }]);
        buffer.ingest(vec![LogEntry {
            timestamp: "2024-01-01 12:00:02".to_string(),
            level: LogLevel::Error,
            message: "Tunnel down".to_string(),
        }]);

        let export = buffer.export();
        assert!(export.contains("Checking tunnel"));
        assert!(export.contains("Tunnel down"));

        let errors = render_logs(buffer.filtered(Some(LogLevel::Error)));
        assert_eq!(errors, "[2024-01-01 12:00:02] [ERROR] Tunnel down");
        // Dropping the filter still shows everything pulled so far
        assert_eq!(buffer.filtered(None).count(), 2);
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
