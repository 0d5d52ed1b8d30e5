//! Tunnel and connectivity status model

use std::fmt;

/// High-level tunnel state derived from daemon status labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelStatus {
    Stopped,
    Running,
    /// Anything that is neither cleanly running nor stopped (starting,
    /// restarting, degraded) renders as a warning state
    Transitioning,
}

impl TunnelStatus {
    /// Map a daemon status label onto the three display states
    pub fn from_label(label: &str) -> Self {
        match label {
            "Running" => TunnelStatus::Running,
            "Stopped" => TunnelStatus::Stopped,
            _ => TunnelStatus::Transitioning,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TunnelStatus::Running)
    }
}

impl fmt::Display for TunnelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TunnelStatus::Stopped => "Stopped",
            TunnelStatus::Running => "Running",
            TunnelStatus::Transitioning => "Transitioning",
        };
        f.write_str(label)
    }
}

/// What the QR panel should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrState {
    /// No active tunnel; show the placeholder text
    Placeholder,
    /// Regenerate the code for this URL (rendering is external)
    Url(String),
}

/// Latest known tunnel status, connectivity and public URL
///
/// Setters are idempotent: applying the value already held changes nothing
/// and reports no change, so redundant poll results do not trigger
/// re-renders.
#[derive(Debug, Clone)]
pub struct StatusModel {
    tunnel: TunnelStatus,
    connectivity: bool,
    tunnel_url: Option<String>,
    qr: QrState,
}

impl Default for StatusModel {
    fn default() -> Self {
        Self {
            tunnel: TunnelStatus::Stopped,
            connectivity: false,
            tunnel_url: None,
            qr: QrState::Placeholder,
        }
    }
}

impl StatusModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a tunnel status change; `Stopped` also clears the URL and
    /// resets the QR panel to its placeholder. Returns whether anything
    /// observable changed.
    pub fn set_tunnel_status(&mut self, status: TunnelStatus) -> bool {
        if self.tunnel == status {
            return false;
        }

        self.tunnel = status;
        if status == TunnelStatus::Stopped {
            self.tunnel_url = None;
            self.qr = QrState::Placeholder;
        }
        true
    }

    /// Apply an internet connectivity change
    pub fn set_connectivity(&mut self, connected: bool) -> bool {
        if self.connectivity == connected {
            return false;
        }
        self.connectivity = connected;
        true
    }

    /// Apply a tunnel URL update; setting a new URL flips the QR panel to
    /// regenerate for it. `None` clears both URL and QR code.
    pub fn set_tunnel_url(&mut self, url: Option<String>) -> bool {
        if self.tunnel_url == url {
            return false;
        }

        match &url {
            Some(u) => self.qr = QrState::Url(u.clone()),
            None => self.qr = QrState::Placeholder,
        }
        self.tunnel_url = url;
        true
    }

    pub fn tunnel_status(&self) -> TunnelStatus {
        self.tunnel
    }

    pub fn connectivity(&self) -> bool {
        self.connectivity
    }

    pub fn tunnel_url(&self) -> Option<&str> {
        self.tunnel_url.as_deref()
    }

    pub fn qr(&self) -> &QrState {
        &self.qr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_mapping() {
        assert_eq!(TunnelStatus::from_label("Running"), TunnelStatus::Running);
        assert_eq!(TunnelStatus::from_label("Stopped"), TunnelStatus::Stopped);
        assert_eq!(
            TunnelStatus::from_label("Restarting"),
            TunnelStatus::Transitioning
        );
    }

    #[test]
    fn test_stopped_clears_url_and_qr() {
        let mut model = StatusModel::new();
        model.set_tunnel_status(TunnelStatus::Running);
        model.set_tunnel_url(Some("https://x.trycloudflare.com".to_string()));
        assert_eq!(model.tunnel_url(), Some("https://x.trycloudflare.com"));
        assert!(matches!(model.qr(), QrState::Url(_)));

        assert!(model.set_tunnel_status(TunnelStatus::Stopped));
        assert_eq!(model.tunnel_url(), None);
        assert_eq!(*model.qr(), QrState::Placeholder);
    }

    #[test]
    fn test_stopped_is_idempotent() {
        let mut model = StatusModel::new();
        model.set_tunnel_status(TunnelStatus::Running);
        model.set_tunnel_url(Some("https://x.trycloudflare.com".to_string()));

        assert!(model.set_tunnel_status(TunnelStatus::Stopped));
        let after_first = model.clone();

        // Second application is a no-op and reports no change
        assert!(!model.set_tunnel_status(TunnelStatus::Stopped));
        assert_eq!(model.tunnel_url(), after_first.tunnel_url());
        assert_eq!(model.qr(), after_first.qr());
        assert_eq!(model.tunnel_status(), after_first.tunnel_status());
    }

    #[test]
    fn test_running_does_not_touch_url() {
        let mut model = StatusModel::new();
        model.set_tunnel_url(Some("https://x.trycloudflare.com".to_string()));
        model.set_tunnel_status(TunnelStatus::Running);
        assert_eq!(model.tunnel_url(), Some("https://x.trycloudflare.com"));
    }

    #[test]
    fn test_same_url_reports_no_change() {
        let mut model = StatusModel::new();
        assert!(model.set_tunnel_url(Some("https://a".to_string())));
        assert!(!model.set_tunnel_url(Some("https://a".to_string())));
    }

    #[test]
    fn test_connectivity_idempotent() {
        let mut model = StatusModel::new();
        assert!(model.set_connectivity(true));
        assert!(!model.set_connectivity(true));
        assert!(model.set_connectivity(false));
    }
}
