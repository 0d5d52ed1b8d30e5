//! Snapshot-to-text rendering
//!
//! Pure functions from view state to terminal text, kept free of any I/O so
//! they are trivially testable.

use std::fmt;

use chrono::{DateTime, Local};

use tunnelmon_api::{LogLevel, Settings};
use tunnelmon_client::{ChannelStatus, DashboardSnapshot, QrState};

/// Placeholder shown while no public URL is known
pub const URL_PLACEHOLDER: &str = "Not available";

/// Quality bands for the latest round-trip time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PingQuality {
    pub fn from_ms(ms: f64) -> Self {
        if ms < 50.0 {
            PingQuality::Excellent
        } else if ms < 100.0 {
            PingQuality::Good
        } else if ms < 200.0 {
            PingQuality::Fair
        } else {
            PingQuality::Poor
        }
    }
}

impl fmt::Display for PingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PingQuality::Excellent => "Excellent",
            PingQuality::Good => "Good",
            PingQuality::Fair => "Fair",
            PingQuality::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// Seconds to HH:MM:SS, hours not wrapped at 24
pub fn format_uptime(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Filename for a log export, derived from the export time
pub fn export_filename(now: &DateTime<Local>) -> String {
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
        .replace([':', '.'], "-");
    format!("tunnel_logs_{}.txt", stamp)
}

pub fn render_dashboard(snap: &DashboardSnapshot) -> String {
    let mut out = String::new();

    out.push_str("== Tunnel Monitor ==\n");
    out.push_str(&format!("Status:    {}\n", snap.tunnel_status));
    out.push_str(&format!(
        "Internet:  {}\n",
        if snap.connectivity {
            "Connected"
        } else {
            "Disconnected"
        }
    ));
    out.push_str(&format!(
        "Push:      {}\n",
        match snap.channel {
            ChannelStatus::Connected => "Connected",
            ChannelStatus::Disconnected => "Reconnecting",
            ChannelStatus::Exhausted => "Unavailable (polling only)",
        }
    ));
    out.push_str(&format!(
        "URL:       {}\n",
        snap.tunnel_url.as_deref().unwrap_or(URL_PLACEHOLDER)
    ));
    if let QrState::Url(url) = &snap.qr {
        out.push_str(&format!("QR:        scan to open {}\n", url));
    }
    if let Some(uptime) = snap.uptime_secs {
        out.push_str(&format!("Uptime:    {}\n", format_uptime(uptime)));
    }

    out.push('\n');
    out.push_str(&format!(
        "Starts: {}   Disconnects: {}",
        snap.tunnel_starts.map_or("-".to_string(), |n| n.to_string()),
        snap.internet_disconnects
            .map_or("-".to_string(), |n| n.to_string()),
    ));
    if snap.notifications {
        out.push_str(&format!(
            "   Messages: {}",
            snap.messages_sent.map_or("-".to_string(), |n| n.to_string())
        ));
    }
    out.push('\n');
    if let Some(last_check) = &snap.last_check {
        out.push_str(&format!("Last check: {}\n", last_check));
    }

    out.push('\n');
    match snap.last_ping_ms {
        Some(ms) => out.push_str(&format!(
            "Ping: {:.1} ms ({})\n",
            ms,
            PingQuality::from_ms(ms)
        )),
        None => out.push_str("Ping: Unavailable\n"),
    }
    if let Some(stats) = snap.latency.stats() {
        out.push_str(&format!(
            "      avg {:.1}  min {:.1}  max {:.1}  over {} probes\n",
            stats.avg, stats.min, stats.max, stats.count
        ));
    }

    if !snap.alerts.is_empty() {
        out.push('\n');
        for alert in &snap.alerts {
            out.push_str(&format!("[{:?}] {}\n", alert.severity, alert.message));
        }
    }

    if !snap.logs.is_empty() {
        out.push_str("\n-- Recent activity --\n");
        for entry in &snap.logs {
            out.push_str(&format!(
                "[{}] [{}] {}\n",
                entry.timestamp, entry.level, entry.message
            ));
        }
    }

    out
}

pub fn render_logs<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a tunnelmon_api::LogEntry>,
{
    entries
        .into_iter()
        .map(|e| format!("[{}] [{}] {}", e.timestamp, e.level, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_settings(settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str(&format!("tunnel_url       = {}\n", settings.tunnel_url));
    out.push_str(&format!("check_interval   = {}\n", settings.check_interval));
    out.push_str(&format!("max_retries      = {}\n", settings.max_retries));
    out.push_str(&format!("retry_delay      = {}\n", settings.retry_delay));
    out.push_str(&format!("debug_mode       = {}\n", settings.debug_mode));

    let optional = [
        ("whatsapp_contact", settings.whatsapp_contact.clone()),
        ("message_template", settings.message_template.clone()),
        ("chrome_path", settings.chrome_path.clone()),
        ("cloudflared_path", settings.cloudflared_path.clone()),
        (
            "headless_mode",
            settings.headless_mode.map(|b| b.to_string()),
        ),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            out.push_str(&format!("{:<16} = {}\n", key, value));
        }
    }

    out
}

/// Parse a `--level` argument into a daemon log level
pub fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    match s.to_ascii_lowercase().as_str() {
        "info" => Ok(LogLevel::Info),
        "success" => Ok(LogLevel::Success),
        "warning" => Ok(LogLevel::Warning),
        "error" => Ok(LogLevel::Error),
        "debug" => Ok(LogLevel::Debug),
        other => Err(format!("unknown log level: {}", other)),
    }
}
