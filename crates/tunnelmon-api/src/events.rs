use serde::{Deserialize, Serialize};

use crate::models::{AlertSeverity, PingResponse};

/// Typed push-channel events, decoded from `{"event": ..., "data": ...}` frames
///
/// The daemon emits these proactively; the same data is also reachable by
/// polling, so a client that never receives a single push event still works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// Server-originated alert, forwarded verbatim to the user
    Notification {
        message: String,
        #[serde(rename = "type")]
        severity: AlertSeverity,
    },
    /// Tunnel status changed
    Status { status: String },
    /// Tunnel became reachable at a new public URL
    TunnelUrl { url: String },
    /// Internet connectivity changed
    InternetStatus { status: bool },
    /// Latency update carrying history (sent on connect as backfill)
    PingData(PingResponse),
    /// Single live latency tick (steady state, no history attached)
    RealTimePing(PingResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_status_event() {
        let frame = r#"{"event": "status", "data": {"status": "Running"}}"#;
        let event: PushEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(event, PushEvent::Status { status } if status == "Running"));
    }

    #[test]
    fn test_decode_notification_event() {
        let frame = r#"{"event": "notification", "data": {"message": "Tunnel restarted", "type": "warning"}}"#;
        let event: PushEvent = serde_json::from_str(frame).unwrap();
        match event {
            PushEvent::Notification { message, severity } => {
                assert_eq!(message, "Tunnel restarted");
                assert_eq!(severity, AlertSeverity::Warning);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_real_time_ping() {
        let frame = r#"{"event": "real_time_ping", "data": {"last_ping_time": 42.5, "stats": {"avg": 40.2, "min": 20.0, "max": 80.0, "count": 10}}}"#;
        let event: PushEvent = serde_json::from_str(frame).unwrap();
        match event {
            PushEvent::RealTimePing(ping) => {
                assert_eq!(ping.last_ping_time, Some(42.5));
                assert_eq!(ping.stats.unwrap().count, 10);
                assert!(ping.ping_history.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let frame = r#"{"event": "totally_new", "data": {}}"#;
        assert!(serde_json::from_str::<PushEvent>(frame).is_err());
    }
}
