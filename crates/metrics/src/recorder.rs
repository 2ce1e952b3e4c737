//! Metrics recorder initialization.

use {anyhow::Result, std::net::SocketAddr, tracing::info};

/// Configuration for the metrics system.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    /// Address for the Prometheus scrape endpoint. `None` disables export.
    pub listen: Option<SocketAddr>,
    /// Global labels to add to all metrics
    pub global_labels: Vec<(String, String)>,
}

/// Install the global recorder.
///
/// With the `prometheus` feature and a listen address, this starts an HTTP
/// scrape endpoint on the current tokio runtime. Otherwise metrics are
/// discarded.
pub fn init_metrics(config: MetricsRecorderConfig) -> Result<()> {
    let Some(listen) = config.listen else {
        info!("metrics export disabled");
        return Ok(());
    };

    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;

        let mut builder = PrometheusBuilder::new().with_http_listener(listen);
        for (key, value) in config.global_labels {
            builder = builder.add_global_label(key, value);
        }
        builder.install()?;
        info!(%listen, "prometheus exporter listening");
    }

    #[cfg(not(feature = "prometheus"))]
    {
        let _ = config.global_labels;
        info!(%listen, "metrics feature not enabled at compile time, ignoring listen address");
    }

    Ok(())
}
