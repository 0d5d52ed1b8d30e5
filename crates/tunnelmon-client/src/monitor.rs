//! State synchronization core
//!
//! The monitor reconciles three update paths — push events, periodic poll
//! results and user-triggered action outcomes — into one consistent view
//! state. All updates flow through a single mpsc stream and are applied to
//! completion in arrival order, so the only ordering guarantee is
//! last-applied-write-wins per field, exactly like the single-threaded
//! event loop this models.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

use tunnelmon_api::{
    AlertSeverity, DaemonStats, LatencySample, LogEntry, PingResponse, PushEvent, Settings,
};

use crate::alerts::{Alert, AlertQueue};
use crate::channel::ChannelStatus;
use crate::latency::LatencySeries;
use crate::logs::{LogBuffer, PAGE_CAP};
use crate::status::{QrState, StatusModel, TunnelStatus};

/// One unit of the merged update stream
#[derive(Debug)]
pub enum Update {
    /// Push channel transport state changed
    Channel(ChannelStatus),
    /// Typed push event from the daemon
    Event(PushEvent),
    /// Poll result: `GET /api/stats`
    Stats(DaemonStats),
    /// Poll result: `GET /api/logs`
    Logs(Vec<LogEntry>),
    /// Poll result: `GET /api/ping`
    Ping(PingResponse),
    /// Settings loaded or reloaded
    Settings(Settings),
}

/// User-triggered actions, used as busy-guard keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionKind {
    Start,
    Stop,
    TestNotification,
    SaveSettings,
    ResetSettings,
}

/// Monitor construction options
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Log retention cap (10 for the dashboard widget, 1000 for the logs page)
    pub log_cap: usize,
    /// Whether notification-variant actions and fields are active
    pub notifications: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            log_cap: PAGE_CAP,
            notifications: false,
        }
    }
}

/// Everything a view needs to render, cloned out under the lock
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub tunnel_status: TunnelStatus,
    pub connectivity: bool,
    pub tunnel_url: Option<String>,
    pub qr: QrState,
    pub uptime_secs: Option<f64>,
    pub tunnel_starts: Option<u64>,
    pub internet_disconnects: Option<u64>,
    pub messages_sent: Option<u64>,
    pub last_check: Option<String>,
    pub last_ping_ms: Option<f64>,
    pub latency: LatencySeries,
    pub logs: Vec<LogEntry>,
    pub alerts: Vec<Alert>,
    pub settings: Option<Settings>,
    pub channel: ChannelStatus,
    pub busy: Vec<ActionKind>,
    pub notifications: bool,
}

/// Mutable view state; DOM/terminal-free so it is testable in isolation
#[derive(Debug)]
pub struct MonitorState {
    options: MonitorOptions,
    status: StatusModel,
    latency: LatencySeries,
    logs: LogBuffer,
    alerts: AlertQueue,
    settings: Option<Settings>,
    uptime_secs: Option<f64>,
    tunnel_starts: Option<u64>,
    internet_disconnects: Option<u64>,
    messages_sent: Option<u64>,
    last_check: Option<String>,
    last_ping_ms: Option<f64>,
    channel: ChannelStatus,
    busy: BTreeSet<ActionKind>,
}

impl MonitorState {
    pub fn new(options: MonitorOptions) -> Self {
        Self {
            logs: LogBuffer::new(options.log_cap),
            options,
            status: StatusModel::new(),
            latency: LatencySeries::new(),
            alerts: AlertQueue::new(),
            settings: None,
            uptime_secs: None,
            tunnel_starts: None,
            internet_disconnects: None,
            messages_sent: None,
            last_check: None,
            last_ping_ms: None,
            channel: ChannelStatus::Disconnected,
            busy: BTreeSet::new(),
        }
    }

    /// Apply one update to completion. `now_epoch` is "now" in epoch seconds
    /// for latency-window decisions (injected for testability).
    pub fn apply(&mut self, update: Update, now_epoch: f64) {
        match update {
            Update::Channel(status) => {
                debug!("Push channel is now {:?}", status);
                self.channel = status;
            }
            Update::Event(event) => self.apply_event(event, now_epoch),
            Update::Stats(stats) => {
                self.status
                    .set_tunnel_status(TunnelStatus::from_label(&stats.current_status));
                if let Some(url) = stats.last_tunnel_url {
                    self.status.set_tunnel_url(Some(url));
                }
                self.uptime_secs = Some(stats.total_uptime);
                self.tunnel_starts = Some(stats.tunnel_starts);
                self.internet_disconnects = Some(stats.internet_disconnects);
                if stats.messages_sent.is_some() {
                    self.messages_sent = stats.messages_sent;
                }
                self.last_check = Some(chrono::Local::now().format("%H:%M:%S").to_string());
            }
            Update::Logs(batch) => self.logs.ingest(batch),
            Update::Ping(ping) => self.apply_ping(ping, now_epoch),
            Update::Settings(settings) => self.settings = Some(settings),
        }

        self.alerts.sweep(Instant::now());
    }

    fn apply_event(&mut self, event: PushEvent, now_epoch: f64) {
        match event {
            PushEvent::Notification { message, severity } => self.alerts.push(message, severity),
            PushEvent::Status { status } => {
                self.status
                    .set_tunnel_status(TunnelStatus::from_label(&status));
            }
            PushEvent::TunnelUrl { url } => {
                self.status.set_tunnel_url(Some(url));
            }
            PushEvent::InternetStatus { status } => {
                self.status.set_connectivity(status);
            }
            // Backfill: same shape as a poll response
            PushEvent::PingData(ping) => self.apply_ping(ping, now_epoch),
            // Steady-state live tick: always a single-point append
            PushEvent::RealTimePing(ping) => {
                self.last_ping_ms = ping.last_ping_time;
                self.latency.append_live(
                    LatencySample {
                        timestamp: now_epoch,
                        latency_ms: ping.last_ping_time,
                    },
                    ping.stats.as_ref(),
                );
            }
        }
    }

    fn apply_ping(&mut self, ping: PingResponse, now_epoch: f64) {
        self.last_ping_ms = ping.last_ping_time;
        self.latency.record_stats(ping.stats.as_ref());

        // An absent or empty history is "no chart update", never an error;
        // a later live tick will win by arriving later.
        match ping.ping_history {
            Some(history) if !history.is_empty() => {
                self.latency
                    .replace_from_history(&history, ping.stats.as_ref(), now_epoch);
            }
            _ => {}
        }
    }

    pub fn begin_action(&mut self, kind: ActionKind) -> bool {
        self.busy.insert(kind)
    }

    pub fn finish_action(&mut self, kind: ActionKind) {
        self.busy.remove(&kind);
    }

    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.busy.contains(&kind)
    }

    pub fn raise_alert(&mut self, message: impl Into<String>, severity: AlertSeverity) {
        self.alerts.push(message, severity);
    }

    pub fn set_tunnel_status(&mut self, status: TunnelStatus) {
        self.status.set_tunnel_status(status);
    }

    pub fn status(&self) -> &StatusModel {
        &self.status
    }

    pub fn latency(&self) -> &LatencySeries {
        &self.latency
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            tunnel_status: self.status.tunnel_status(),
            connectivity: self.status.connectivity(),
            tunnel_url: self.status.tunnel_url().map(str::to_string),
            qr: self.status.qr().clone(),
            uptime_secs: self.uptime_secs,
            tunnel_starts: self.tunnel_starts,
            internet_disconnects: self.internet_disconnects,
            messages_sent: self.messages_sent,
            last_check: self.last_check.clone(),
            last_ping_ms: self.last_ping_ms,
            latency: self.latency.clone(),
            logs: self.logs.entries().cloned().collect(),
            alerts: self.alerts.iter().cloned().collect(),
            settings: self.settings.clone(),
            channel: self.channel,
            busy: self.busy.iter().copied().collect(),
            notifications: self.options.notifications,
        }
    }
}

/// Shared handle over the monitor state with change notification
#[derive(Clone)]
pub struct Monitor {
    state: Arc<Mutex<MonitorState>>,
    revision: watch::Sender<u64>,
}

impl Monitor {
    pub fn new(options: MonitorOptions) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(MonitorState::new(options))),
            revision,
        }
    }

    /// Subscribe to change notifications; the value is a revision counter
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let mut state = self.state.lock().await;
        state.alerts.sweep(Instant::now());
        state.snapshot()
    }

    /// Apply one update and notify subscribers
    pub async fn apply(&self, update: Update) {
        let mut state = self.state.lock().await;
        state.apply(update, epoch_now());
        drop(state);
        self.notify();
    }

    /// Consume the merged update stream until all producers hang up
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<Update>) {
        while let Some(update) = rx.recv().await {
            self.apply(update).await;
        }
    }

    /// Mark an action busy; returns false when it already was (debounce)
    pub async fn begin_action(&self, kind: ActionKind) -> bool {
        let started = self.state.lock().await.begin_action(kind);
        if started {
            self.notify();
        }
        started
    }

    pub async fn finish_action(&self, kind: ActionKind) {
        self.state.lock().await.finish_action(kind);
        self.notify();
    }

    pub async fn raise_alert(&self, message: impl Into<String>, severity: AlertSeverity) {
        self.state.lock().await.raise_alert(message, severity);
        self.notify();
    }

    pub async fn set_tunnel_status(&self, status: TunnelStatus) {
        self.state.lock().await.set_tunnel_status(status);
        self.notify();
    }

    pub async fn store_settings(&self, settings: Settings) {
        self.state.lock().await.settings = Some(settings);
        self.notify();
    }

    pub async fn clear_logs(&self) {
        self.state.lock().await.clear_logs();
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnelmon_api::{LatencyStats, LogLevel};

    fn state() -> MonitorState {
        MonitorState::new(MonitorOptions::default())
    }

    #[test]
    fn test_stats_update_populates_view() {
        let mut s = state();
        s.apply(
            Update::Stats(DaemonStats {
                tunnel_starts: 5,
                internet_disconnects: 2,
                messages_sent: None,
                total_uptime: 3661.0,
                current_status: "Running".to_string(),
                last_tunnel_url: Some("https://x.trycloudflare.com".to_string()),
            }),
            1000.0,
        );

        let snap = s.snapshot();
        assert_eq!(snap.tunnel_status, TunnelStatus::Running);
        assert_eq!(snap.uptime_secs, Some(3661.0));
        assert_eq!(snap.tunnel_starts, Some(5));
        assert_eq!(snap.internet_disconnects, Some(2));
        assert_eq!(snap.tunnel_url.as_deref(), Some("https://x.trycloudflare.com"));
        // URL arrival drives QR regeneration
        assert_eq!(
            snap.qr,
            QrState::Url("https://x.trycloudflare.com".to_string())
        );
        assert!(snap.last_check.is_some());
    }

    #[test]
    fn test_ping_poll_with_history_replaces_series() {
        let mut s = state();
        let history = vec![
            LatencySample {
                timestamp: 990.0,
                latency_ms: Some(30.0),
            },
            LatencySample {
                timestamp: 995.0,
                latency_ms: Some(40.0),
            },
        ];
        s.apply(
            Update::Ping(PingResponse {
                last_ping_time: Some(35.0),
                stats: Some(LatencyStats {
                    avg: 40.2,
                    min: 20.0,
                    max: 80.0,
                    count: 10,
                }),
                ping_history: Some(history),
            }),
            1000.0,
        );

        let snap = s.snapshot();
        assert_eq!(snap.last_ping_ms, Some(35.0));
        assert_eq!(snap.latency.len(), 2);
        assert_eq!(snap.latency.stats().unwrap().avg, 40.2);
    }

    #[test]
    fn test_null_history_poll_then_live_tick_wins() {
        let mut s = state();

        // Seed with some history
        s.apply(
            Update::Ping(PingResponse {
                last_ping_time: Some(30.0),
                stats: None,
                ping_history: Some(vec![LatencySample {
                    timestamp: 995.0,
                    latency_ms: Some(30.0),
                }]),
            }),
            1000.0,
        );
        assert_eq!(s.latency().len(), 1);

        // Null-history poll: value updates, chart untouched
        s.apply(
            Update::Ping(PingResponse {
                last_ping_time: Some(99.0),
                stats: None,
                ping_history: Some(vec![]),
            }),
            1001.0,
        );
        assert_eq!(s.latency().len(), 1);

        // Live tick arriving later is the most-recent write and appends
        s.apply(
            Update::Event(PushEvent::RealTimePing(PingResponse {
                last_ping_time: Some(42.0),
                stats: None,
                ping_history: None,
            })),
            1002.0,
        );

        let snap = s.snapshot();
        assert_eq!(snap.last_ping_ms, Some(42.0));
        assert_eq!(snap.latency.len(), 2);
        assert_eq!(snap.latency.last().unwrap().timestamp, 1002.0);
    }

    #[test]
    fn test_push_status_stopped_clears_url() {
        let mut s = state();
        s.apply(
            Update::Event(PushEvent::TunnelUrl {
                url: "https://x.trycloudflare.com".to_string(),
            }),
            0.0,
        );
        s.apply(
            Update::Event(PushEvent::Status {
                status: "Stopped".to_string(),
            }),
            0.0,
        );

        let snap = s.snapshot();
        assert_eq!(snap.tunnel_status, TunnelStatus::Stopped);
        assert_eq!(snap.tunnel_url, None);
        assert_eq!(snap.qr, QrState::Placeholder);
    }

    #[test]
    fn test_notification_event_raises_alert() {
        let mut s = state();
        s.apply(
            Update::Event(PushEvent::Notification {
                message: "Tunnel restarted".to_string(),
                severity: AlertSeverity::Warning,
            }),
            0.0,
        );

        let snap = s.snapshot();
        assert_eq!(snap.alerts.len(), 1);
        assert_eq!(snap.alerts[0].message, "Tunnel restarted");
    }

    #[test]
    fn test_logs_respect_cap() {
        let mut s = MonitorState::new(MonitorOptions {
            log_cap: 10,
            notifications: false,
        });

        let batch = |range: std::ops::Range<usize>| {
            Update::Logs(
                range
                    .map(|n| LogEntry {
                        timestamp: format!("t{}", n),
                        level: LogLevel::Info,
                        message: format!("m{}", n),
                    })
                    .collect(),
            )
        };

        s.apply(batch(0..8), 0.0);
        s.apply(batch(8..13), 0.0);
        s.apply(batch(13..16), 0.0);

        let snap = s.snapshot();
        assert_eq!(snap.logs.len(), 10);
        assert_eq!(snap.logs[0].message, "m6");
        assert_eq!(snap.logs[9].message, "m15");
    }

    #[test]
    fn test_busy_guard_debounces() {
        let mut s = state();
        assert!(s.begin_action(ActionKind::Start));
        // Second trigger while busy is refused
        assert!(!s.begin_action(ActionKind::Start));
        // Independent actions are unaffected
        assert!(s.begin_action(ActionKind::Stop));

        s.finish_action(ActionKind::Start);
        assert!(s.begin_action(ActionKind::Start));
    }

    #[test]
    fn test_channel_status_tracked() {
        let mut s = state();
        assert_eq!(s.snapshot().channel, ChannelStatus::Disconnected);
        s.apply(Update::Channel(ChannelStatus::Connected), 0.0);
        assert_eq!(s.snapshot().channel, ChannelStatus::Connected);
        s.apply(Update::Channel(ChannelStatus::Exhausted), 0.0);
        assert_eq!(s.snapshot().channel, ChannelStatus::Exhausted);
    }

    #[tokio::test]
    async fn test_monitor_applies_stream_in_arrival_order() {
        let monitor = Monitor::new(MonitorOptions::default());
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(Update::Event(PushEvent::Status {
            status: "Running".to_string(),
        }))
        .unwrap();
        tx.send(Update::Event(PushEvent::Status {
            status: "Stopped".to_string(),
        }))
        .unwrap();
        drop(tx);

        monitor.run(rx).await;
        let snap = monitor.snapshot().await;
        assert_eq!(snap.tunnel_status, TunnelStatus::Stopped);
    }
}
