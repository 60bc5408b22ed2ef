//! Metrics recorder initialization and configuration.

use {
    crate::{Error, Result},
    std::net::SocketAddr,
    tracing::info,
};

/// Configuration for the metrics system.
#[derive(Debug, Clone)]
pub struct MetricsRecorderConfig {
    /// Whether metrics collection is enabled
    pub enabled: bool,
    /// Address the Prometheus scrape endpoint listens on
    pub listen: SocketAddr,
    /// Global labels to add to all metrics
    pub global_labels: Vec<(String, String)>,
}

impl Default for MetricsRecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: SocketAddr::from(([127, 0, 0, 1], 9464)),
            global_labels: Vec::new(),
        }
    }
}

/// Initialize the metrics system.
///
/// Call once at start-up from inside a Tokio runtime. With the `prometheus`
/// feature this installs the global recorder and spawns the scrape listener;
/// otherwise the facade stays a no-op.
///
/// # Errors
///
/// Returns an error if the recorder or listener cannot be installed.
pub fn init_metrics(config: MetricsRecorderConfig) -> Result<()> {
    if !config.enabled {
        info!("metrics collection is disabled");
        return Ok(());
    }

    if let Some((key, _)) = config
        .global_labels
        .iter()
        .find(|(key, _)| !is_valid_label_name(key))
    {
        return Err(Error::message(format!("invalid metric label name {key:?}")));
    }

    #[cfg(feature = "prometheus")]
    {
        init_prometheus(&config)?;
        info!(listen = %config.listen, "prometheus metrics exporter initialized");
        Ok(())
    }

    #[cfg(not(feature = "prometheus"))]
    {
        info!("metrics feature not enabled at compile time");
        Ok(())
    }
}

/// Prometheus label names: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(feature = "prometheus")]
fn init_prometheus(config: &MetricsRecorderConfig) -> Result<()> {
    use {
        crate::buckets,
        metrics_exporter_prometheus::{Matcher, PrometheusBuilder},
    };

    let mut builder = PrometheusBuilder::new()
        .with_http_listener(config.listen)
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            buckets::HANDLER_DURATION,
        )?;

    for (key, value) in &config.global_labels {
        builder = builder.add_global_label(key, value);
    }

    builder.install()?;
    Ok(())
}
