use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters and status reported by `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStats {
    /// Number of times the tunnel process was (re)started
    pub tunnel_starts: u64,
    /// Number of internet connectivity drops observed by the daemon
    pub internet_disconnects: u64,
    /// Notification messages sent (notification variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_sent: Option<u64>,
    /// Daemon uptime in seconds
    pub total_uptime: f64,
    /// Current tunnel status label ("Running", "Stopped", ...)
    pub current_status: String,
    /// Last public URL the tunnel was reachable at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tunnel_url: Option<String>,
}

/// Log severity levels used by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(label)
    }
}

/// One daemon log line, as served by `GET /api/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Daemon-formatted timestamp string
    pub timestamp: String,
    /// Severity level
    pub level: LogLevel,
    /// Log message text
    pub message: String,
}

/// One round-trip-time measurement against the probe target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Epoch seconds at which the probe fired
    pub timestamp: f64,
    /// Round-trip time in milliseconds; `None` when the probe failed
    #[serde(rename = "ping_time")]
    pub latency_ms: Option<f64>,
}

/// Derived latency statistics, computed server-side and displayed as-is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// Response of `GET /api/ping`, also carried by push events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Most recent probe result; `None` when the probe failed or has not run
    pub last_ping_time: Option<f64>,
    /// Server-computed statistics over the retained window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LatencyStats>,
    /// Retained probe history, oldest first (may be absent on live ticks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_history: Option<Vec<LatencySample>>,
}

/// Daemon configuration record, read and written wholesale via `/api/settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Local URL the tunnel exposes
    pub tunnel_url: String,
    /// Internet check interval in seconds
    pub check_interval: u64,
    /// Maximum restart retries before the daemon waits for connectivity
    pub max_retries: u32,
    /// Base delay between retries in seconds
    pub retry_delay: u64,
    /// Verbose daemon logging
    pub debug_mode: bool,
    /// Notification recipient (notification variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_contact: Option<String>,
    /// Notification message template (notification variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    /// Browser binary path override (notification variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    /// Tunnel binary path override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudflared_path: Option<String>,
    /// Run the notification browser headless (notification variant only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless_mode: Option<bool>,
}

/// Outcome envelope of every user-triggered POST action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable detail, present on most failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Severity of a transient user-facing alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Success,
    Warning,
    Error,
}
