//! Push-event channel
//!
//! One WebSocket connection per monitor run. The daemon pushes JSON frames
//! (`{"event": ..., "data": ...}`) which are decoded into [`PushEvent`]s and
//! forwarded into the monitor's update stream. Transport failures only flip
//! the connection indicator; the Poller keeps the view alive regardless.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use tunnelmon_api::PushEvent;

use crate::monitor::Update;
use crate::reconnect::{RetryPolicy, RetryState};

/// Transport-level state changes of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connected,
    Disconnected,
    /// Reconnection budget spent; the channel stays down for this run
    Exhausted,
}

/// Wraps the push connection and its bounded reconnection loop
pub struct ConnectionChannel {
    url: Url,
    policy: RetryPolicy,
}

impl ConnectionChannel {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(url: Url, policy: RetryPolicy) -> Self {
        Self { url, policy }
    }

    /// Run the channel on its own task, forwarding updates into `tx`
    pub fn spawn(self, tx: mpsc::UnboundedSender<Update>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    async fn run(self, tx: mpsc::UnboundedSender<Update>) {
        let mut retry = RetryState::new(self.policy.clone());

        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!("Push channel connected: {}", self.url);
                    retry.reset();
                    if tx.send(Update::Channel(ChannelStatus::Connected)).is_err() {
                        return;
                    }

                    let (mut write, mut read) = stream.split();
                    while let Some(frame) = read.next().await {
                        match frame {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<PushEvent>(&text) {
                                    Ok(event) => {
                                        if tx.send(Update::Event(event)).is_err() {
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        debug!("Ignoring unrecognized event frame: {}", e)
                                    }
                                }
                            }
                            Ok(Message::Ping(payload)) => {
                                let _ = write.send(Message::Pong(payload)).await;
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Push channel read error: {}", e);
                                break;
                            }
                        }
                    }

                    if tx.send(Update::Channel(ChannelStatus::Disconnected)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("Push channel connect failed: {}", e),
            }

            if retry.wait().await.is_err() {
                warn!("Push channel reconnection attempts exhausted; polling continues");
                let _ = tx.send(Update::Channel(ChannelStatus::Exhausted));
                return;
            }
        }
    }
}
