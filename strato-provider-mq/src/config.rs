//! Provider configuration

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQ provider
///
/// Per-resource wait timeouts live with the resource lifecycles; this
/// only carries what varies per deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqConfig {
    /// Control plane region
    pub region: String,
    /// Override for the control plane endpoint
    pub endpoint: Option<String>,
    /// Sleep between status polls, in seconds
    pub poll_interval_secs: u64,
    /// Grace period before the first status poll, in seconds
    pub wait_delay_secs: u64,
}

impl Default for MqConfig {
    fn default() -> Self {
        Self {
            region: "main".to_string(),
            endpoint: None,
            poll_interval_secs: 5,
            wait_delay_secs: 0,
        }
    }
}

impl MqConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn wait_delay(&self) -> Duration {
        Duration::from_secs(self.wait_delay_secs)
    }
}
