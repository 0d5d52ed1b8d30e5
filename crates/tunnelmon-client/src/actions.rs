//! User-triggered control actions
//!
//! Every action follows the same shape: refuse if the same action is
//! already in flight, fire the request, reflect the outcome as an alert
//! (and any immediate state change), then release the busy guard. Ambient
//! state catches up through polling and push events either way.

use tracing::{info, warn};

use tunnelmon_api::{ActionResponse, AlertSeverity, Settings};

use crate::api_client::ApiClient;
use crate::error::ClientError;
use crate::monitor::{ActionKind, Monitor};
use crate::status::TunnelStatus;

/// Binds the control endpoints to the monitor's view state
#[derive(Clone)]
pub struct ActionController {
    client: ApiClient,
    monitor: Monitor,
}

impl ActionController {
    pub fn new(client: ApiClient, monitor: Monitor) -> Self {
        Self { client, monitor }
    }

    /// Start the tunnel. Returns false when a start is already in flight.
    pub async fn start(&self) -> bool {
        if !self.monitor.begin_action(ActionKind::Start).await {
            return false;
        }

        match self.client.start().await {
            Ok(resp) if resp.is_success() => {
                info!("Tunnel start accepted");
                self.monitor.set_tunnel_status(TunnelStatus::Running).await;
                self.monitor
                    .raise_alert(
                        resp.message.unwrap_or_else(|| "Tunnel starting".to_string()),
                        AlertSeverity::Success,
                    )
                    .await;
            }
            outcome => {
                self.report_failure(outcome, "Failed to start tunnel").await;
            }
        }

        self.monitor.finish_action(ActionKind::Start).await;
        true
    }

    /// Stop the tunnel. Returns false when a stop is already in flight.
    pub async fn stop(&self) -> bool {
        if !self.monitor.begin_action(ActionKind::Stop).await {
            return false;
        }

        match self.client.stop().await {
            Ok(resp) if resp.is_success() => {
                info!("Tunnel stop accepted");
                self.monitor.set_tunnel_status(TunnelStatus::Stopped).await;
                self.monitor
                    .raise_alert(
                        resp.message.unwrap_or_else(|| "Tunnel stopped".to_string()),
                        AlertSeverity::Success,
                    )
                    .await;
            }
            outcome => {
                self.report_failure(outcome, "Failed to stop tunnel").await;
            }
        }

        self.monitor.finish_action(ActionKind::Stop).await;
        true
    }

    /// Send a test notification (notification variant only)
    pub async fn test_notification(&self) -> bool {
        if !self
            .monitor
            .begin_action(ActionKind::TestNotification)
            .await
        {
            return false;
        }

        match self.client.test_notification().await {
            Ok(resp) if resp.is_success() => {
                self.monitor
                    .raise_alert(
                        resp.message
                            .unwrap_or_else(|| "Test notification sent".to_string()),
                        AlertSeverity::Success,
                    )
                    .await;
            }
            outcome => {
                self.report_failure(outcome, "Failed to send test notification")
                    .await;
            }
        }

        self.monitor
            .finish_action(ActionKind::TestNotification)
            .await;
        true
    }

    /// Submit the full settings record; on success the submitted copy
    /// becomes the local view state
    pub async fn save_settings(&self, settings: Settings) -> bool {
        if !self.monitor.begin_action(ActionKind::SaveSettings).await {
            return false;
        }

        match self.client.save_settings(&settings).await {
            Ok(resp) if resp.is_success() => {
                self.monitor.store_settings(settings).await;
                self.monitor
                    .raise_alert(
                        resp.message.unwrap_or_else(|| "Settings saved".to_string()),
                        AlertSeverity::Success,
                    )
                    .await;
            }
            outcome => {
                self.report_failure(outcome, "Failed to save settings").await;
            }
        }

        self.monitor.finish_action(ActionKind::SaveSettings).await;
        true
    }

    /// Reset settings to daemon defaults, then reload the current record
    pub async fn reset_settings(&self) -> bool {
        if !self.monitor.begin_action(ActionKind::ResetSettings).await {
            return false;
        }

        match self.client.reset_settings().await {
            Ok(resp) if resp.is_success() => {
                match self.client.settings().await {
                    Ok(settings) => self.monitor.store_settings(settings).await,
                    Err(e) => warn!("Settings reload after reset failed: {}", e),
                }
                self.monitor
                    .raise_alert(
                        resp.message
                            .unwrap_or_else(|| "Settings reset to defaults".to_string()),
                        AlertSeverity::Success,
                    )
                    .await;
            }
            outcome => {
                self.report_failure(outcome, "Failed to reset settings").await;
            }
        }

        self.monitor.finish_action(ActionKind::ResetSettings).await;
        true
    }

    /// Clear logs on the daemon first, then locally once it confirms
    pub async fn clear_logs(&self) -> Result<(), ClientError> {
        let resp = self.client.clear_logs().await?;
        if resp.is_success() {
            self.monitor.clear_logs().await;
        } else {
            self.monitor
                .raise_alert(
                    resp.message.unwrap_or_else(|| "Failed to clear logs".to_string()),
                    AlertSeverity::Error,
                )
                .await;
        }
        Ok(())
    }

    /// A daemon-reported failure keeps its message; transport errors fall
    /// back to a generic one
    async fn report_failure(&self, outcome: Result<ActionResponse, ClientError>, fallback: &str) {
        let message = match outcome {
            Ok(resp) => {
                let msg = resp.message.unwrap_or_else(|| fallback.to_string());
                warn!("Action rejected by daemon: {}", msg);
                msg
            }
            Err(e) => {
                warn!("Action request failed: {}", e);
                fallback.to_string()
            }
        };
        self.monitor.raise_alert(message, AlertSeverity::Error).await;
    }
}
