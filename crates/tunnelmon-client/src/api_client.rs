//! Typed HTTP client for the daemon control API

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use tunnelmon_api::{ActionResponse, DaemonStats, LogEntry, PingResponse, Settings};

use crate::error::ClientError;

/// Thin typed wrapper over the daemon's REST endpoints
///
/// Every call is a single request/response round-trip; retries and
/// scheduling are the caller's concern.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client against the daemon at `base_url` (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// WebSocket URL of the push-event endpoint derived from the base URL
    pub fn events_url(&self) -> Result<Url, ClientError> {
        let mut url = self.base_url.join("/api/events")?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        // set_scheme only rejects invalid cross-scheme changes; ws/wss are fine here
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Channel(format!("cannot derive ws URL from {}", self.base_url)))?;
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }

        Ok(resp.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.post(url).send().await?;

        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }

        Ok(resp.json().await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.post(url).json(body).send().await?;

        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }

        Ok(resp.json().await?)
    }

    /// `GET /api/stats`
    pub async fn stats(&self) -> Result<DaemonStats, ClientError> {
        self.get("/api/stats").await
    }

    /// `GET /api/logs` — drains log lines accumulated since the last pull
    pub async fn logs(&self) -> Result<Vec<LogEntry>, ClientError> {
        self.get("/api/logs").await
    }

    /// `POST /api/logs/clear`
    pub async fn clear_logs(&self) -> Result<ActionResponse, ClientError> {
        self.post("/api/logs/clear").await
    }

    /// `GET /api/ping`
    pub async fn ping(&self) -> Result<PingResponse, ClientError> {
        self.get("/api/ping").await
    }

    /// `GET /api/settings`
    pub async fn settings(&self) -> Result<Settings, ClientError> {
        self.get("/api/settings").await
    }

    /// `POST /api/settings` — submits the whole record
    pub async fn save_settings(&self, settings: &Settings) -> Result<ActionResponse, ClientError> {
        self.post_json("/api/settings", settings).await
    }

    /// `POST /api/settings/reset`
    pub async fn reset_settings(&self) -> Result<ActionResponse, ClientError> {
        self.post("/api/settings/reset").await
    }

    /// `POST /api/start`
    pub async fn start(&self) -> Result<ActionResponse, ClientError> {
        self.post("/api/start").await
    }

    /// `POST /api/stop`
    pub async fn stop(&self) -> Result<ActionResponse, ClientError> {
        self.post("/api/stop").await
    }

    /// `POST /api/test_whatsapp` (notification variant only)
    pub async fn test_notification(&self) -> Result<ActionResponse, ClientError> {
        self.post("/api/test_whatsapp").await
    }
}
