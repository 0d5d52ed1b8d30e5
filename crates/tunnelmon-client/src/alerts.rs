//! Transient user-facing alert queue

use std::time::{Duration, Instant};

use tunnelmon_api::AlertSeverity;

/// How long an alert stays visible before auto-dismissal
pub const ALERT_TTL: Duration = Duration::from_secs(5);

/// One dismissible alert
#[derive(Debug, Clone)]
pub struct Alert {
    pub message: String,
    pub severity: AlertSeverity,
    raised_at: Instant,
}

impl Alert {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.raised_at)
    }
}

/// Queue of transient alerts with time-based expiry
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    alerts: Vec<Alert>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: AlertSeverity) {
        self.alerts.push(Alert {
            message: message.into(),
            severity,
            raised_at: Instant::now(),
        });
    }

    /// Drop alerts older than the TTL
    pub fn sweep(&mut self, now: Instant) {
        self.alerts.retain(|a| a.age(now) < ALERT_TTL);
    }

    /// Manually dismiss one alert by position
    pub fn dismiss(&mut self, index: usize) {
        if index < self.alerts.len() {
            self.alerts.remove(index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_expires_old_alerts() {
        let mut queue = AlertQueue::new();
        queue.push("saved", AlertSeverity::Success);
        assert_eq!(queue.len(), 1);

        // Still fresh
        queue.sweep(Instant::now());
        assert_eq!(queue.len(), 1);

        // Past the TTL
        queue.sweep(Instant::now() + ALERT_TTL + Duration::from_millis(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dismiss_removes_single_alert() {
        let mut queue = AlertQueue::new();
        queue.push("first", AlertSeverity::Info);
        queue.push("second", AlertSeverity::Error);

        queue.dismiss(0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().message, "second");

        // Out-of-range dismiss is ignored
        queue.dismiss(5);
        assert_eq!(queue.len(), 1);
    }
}
