use crate::config::MetricsConfig;
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};

const METRICS_PREFIX: &str = "lead_relay";

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Sends every metric recorded through the `metrics` facade to StatsD.
pub fn init(config: &MetricsConfig) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::RecorderAlreadySet)?;

    shared::describe_metrics!(lead_webhook::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_installed_once() {
        let config = MetricsConfig {
            statsd_host: "127.0.0.1".to_string(),
            statsd_port: 8125,
        };

        init(&config).expect("install statsd recorder");
        assert!(matches!(
            init(&config).unwrap_err(),
            MetricsError::RecorderAlreadySet
        ));
    }
}
