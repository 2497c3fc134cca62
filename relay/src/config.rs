use lead_webhook::config::{Config as WebhookConfig, Secret};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub sentry_dsn: Option<Secret>,
    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads the optional config file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.webhook.apply_env();

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            webhook:
                listener:
                    host: 127.0.0.1
                    port: 9000
                crm:
                    location_id: loc-1
                    timeout_secs: 30
                retry:
                    delays_ms: [0, 250]
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_host, "127.0.0.1");
        assert_eq!(metrics.statsd_port, 8125);

        let logging = config.common.logging.expect("logging config");
        assert_eq!(
            logging.sentry_dsn.expect("sentry dsn").expose(),
            "https://key@sentry.example.com/1"
        );
        assert_eq!(logging.level, "info");

        assert_eq!(config.webhook.listener.port, 9000);
        assert_eq!(config.webhook.crm.location_id.as_deref(), Some("loc-1"));
        assert_eq!(config.webhook.crm.timeout_secs, Some(30));
        assert_eq!(config.webhook.retry.delays_ms, vec![0, 250]);
        assert!(config.webhook.validate().is_ok());
    }

    #[test]
    fn webhook_section_is_optional() {
        let yaml = r#"
            logging:
                level: debug
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert_eq!(config.common.logging.expect("logging config").level, "debug");
        assert_eq!(config.webhook, WebhookConfig::default());
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/relay.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn invalid_yaml() {
        let tmp = write_tmp_file("webhook: {listener: {port: not-a-port}}");
        let err = Config::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
