/// Config schema types.
use std::{collections::HashMap, net::SocketAddr};

use {
    serde::{Deserialize, Serialize},
    updraft_polling::PollingConfig,
};

/// Root of `updraft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdraftConfig {
    /// Telegram bot account. Kept as raw JSON here and decoded by the
    /// Telegram crate, which owns that schema.
    pub telegram: serde_json::Value,
    pub polling: PollingConfig,
    pub metrics: MetricsConfig,
}

/// Metrics and observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
    /// Address of the Prometheus scrape endpoint.
    pub listen: SocketAddr,
    /// Additional labels to add to all metrics.
    pub labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: SocketAddr::from(([127, 0, 0, 1], 9464)),
            labels: HashMap::new(),
        }
    }
}

impl UpdraftConfig {
    /// The configured bot token, if any, without decoding the rest of the
    /// telegram section.
    pub fn telegram_token(&self) -> Option<&str> {
        self.telegram
            .get("token")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.trim().is_empty())
    }

    /// Set the bot token, creating the telegram section if needed.
    pub fn set_telegram_token(&mut self, token: impl Into<String>) {
        if !self.telegram.is_object() {
            self.telegram = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(section) = self.telegram.as_object_mut() {
            section.insert("token".into(), serde_json::Value::String(token.into()));
        }
    }
}
