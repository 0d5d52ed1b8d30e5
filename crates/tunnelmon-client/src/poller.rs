//! Periodic polling of the daemon's REST endpoints
//!
//! Each endpoint runs on its own fixed-interval loop. Ticks fire on
//! schedule regardless of whether the previous request has completed, so a
//! slow daemon produces overlapping in-flight requests whose responses land
//! in arrival order. Failures are logged and skipped; the next tick retries
//! naturally.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::api_client::ApiClient;
use crate::monitor::Update;

/// Per-endpoint polling cadence
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub stats_interval: Duration,
    pub logs_interval: Duration,
    pub ping_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(5),
            logs_interval: Duration::from_secs(2),
            ping_interval: Duration::from_secs(5),
        }
    }
}

impl PollerConfig {
    /// Cadence for the dedicated ping page (tighter live chart)
    pub fn ping_page() -> Self {
        Self {
            ping_interval: Duration::from_secs(1),
            ..Self::default()
        }
    }
}

/// Drives the poll loops and forwards results into the monitor stream
pub struct Poller {
    client: ApiClient,
    config: PollerConfig,
}

impl Poller {
    pub fn new(client: ApiClient, config: PollerConfig) -> Self {
        Self { client, config }
    }

    /// Spawn all poll loops plus the one-shot settings load.
    ///
    /// The returned handles run until the update receiver hangs up.
    pub fn spawn(self, tx: mpsc::UnboundedSender<Update>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        // Settings are loaded once; later changes flow through save/reset
        {
            let client = self.client.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                match client.settings().await {
                    Ok(settings) => {
                        let _ = tx.send(Update::Settings(settings));
                    }
                    Err(e) => warn!("Initial settings load failed: {}", e),
                }
            }));
        }

        handles.push(Self::spawn_loop(
            self.config.stats_interval,
            self.client.clone(),
            tx.clone(),
            |client, tx| async move {
                match client.stats().await {
                    Ok(stats) => {
                        let _ = tx.send(Update::Stats(stats));
                    }
                    Err(e) => warn!("Stats poll failed: {}", e),
                }
            },
        ));

        handles.push(Self::spawn_loop(
            self.config.logs_interval,
            self.client.clone(),
            tx.clone(),
            |client, tx| async move {
                match client.logs().await {
                    Ok(batch) => {
                        if !batch.is_empty() {
                            let _ = tx.send(Update::Logs(batch));
                        }
                    }
                    Err(e) => warn!("Log poll failed: {}", e),
                }
            },
        ));

        handles.push(Self::spawn_loop(
            self.config.ping_interval,
            self.client,
            tx,
            |client, tx| async move {
                match client.ping().await {
                    Ok(ping) => {
                        let _ = tx.send(Update::Ping(ping));
                    }
                    Err(e) => warn!("Ping poll failed: {}", e),
                }
            },
        ));

        handles
    }

    /// One fixed-interval loop. Every tick spawns its fetch on a separate
    /// task so slow responses never delay the schedule.
    fn spawn_loop<F, Fut>(
        period: Duration,
        client: ApiClient,
        tx: mpsc::UnboundedSender<Update>,
        fetch: F,
    ) -> JoinHandle<()>
    where
        F: Fn(ApiClient, mpsc::UnboundedSender<Update>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    return;
                }
                tokio::spawn(fetch(client.clone(), tx.clone()));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence() {
        let config = PollerConfig::default();
        assert_eq!(config.stats_interval, Duration::from_secs(5));
        assert_eq!(config.logs_interval, Duration::from_secs(2));
        assert_eq!(config.ping_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_ping_page_tightens_ping_only() {
        let config = PollerConfig::ping_page();
        assert_eq!(config.ping_interval, Duration::from_secs(1));
        assert_eq!(config.stats_interval, Duration::from_secs(5));
        assert_eq!(config.logs_interval, Duration::from_secs(2));
    }
}
