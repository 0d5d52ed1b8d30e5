//! Wire types for the tunnel daemon control API
//!
//! Everything the daemon sends or accepts over its REST endpoints and the
//! push-event channel lives here, so the client crates share one vocabulary.

pub mod events;
pub mod models;

pub use events::PushEvent;
pub use models::{
    ActionResponse, AlertSeverity, DaemonStats, LatencySample, LatencyStats, LogEntry, LogLevel,
    PingResponse, Settings,
};
