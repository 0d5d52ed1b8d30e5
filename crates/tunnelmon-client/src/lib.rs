//! Client-side state synchronization for a tunnel daemon
//!
//! Keeps a local view of a remote daemon consistent through three update
//! paths: periodic REST polling, a push-event WebSocket channel, and
//! user-triggered control actions. All paths converge on one [`Monitor`]
//! that applies updates in arrival order, so renderers only ever observe a
//! consistent snapshot.

pub mod actions;
pub mod alerts;
pub mod api_client;
pub mod channel;
pub mod error;
pub mod latency;
pub mod logs;
pub mod monitor;
pub mod poller;
pub mod reconnect;
pub mod status;

pub use actions::ActionController;
pub use alerts::{Alert, AlertQueue, ALERT_TTL};
pub use api_client::ApiClient;
pub use channel::{ChannelStatus, ConnectionChannel};
pub use error::ClientError;
pub use latency::{LatencySeries, WINDOW_LEN, WINDOW_SECS};
pub use logs::{LogBuffer, DASHBOARD_CAP, PAGE_CAP};
pub use monitor::{ActionKind, DashboardSnapshot, Monitor, MonitorOptions, Update};
pub use poller::{Poller, PollerConfig};
pub use reconnect::{RetryPolicy, RetryState};
pub use status::{QrState, StatusModel, TunnelStatus};
