use crate::config::LoggingConfig;
use sentry::ClientInitGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LEVEL: &str = "info";

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber. Keep the returned guard alive so Sentry can flush on exit.
pub fn init(config: Option<&LoggingConfig>) -> Result<Option<ClientInitGuard>, LoggingError> {
    let level = config.map_or(DEFAULT_LEVEL, |c| c.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let sentry_guard = match config.and_then(|c| c.sentry_dsn.as_ref()) {
        Some(dsn) => Some(sentry::init(sentry::ClientOptions {
            dsn: Some(dsn.expose().parse()?),
            release: sentry::release_name!(),
            ..Default::default()
        })),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            sentry_guard
                .as_ref()
                .map(|_| sentry::integrations::tracing::layer()),
        )
        .try_init()?;

    Ok(sentry_guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_webhook::config::Secret;

    #[test]
    fn invalid_sentry_dsn() {
        let config = LoggingConfig {
            sentry_dsn: Some(Secret::new("not a dsn")),
            level: "info".to_string(),
        };

        assert!(matches!(
            init(Some(&config)),
            Err(LoggingError::InvalidDsn(_))
        ));
    }
}
