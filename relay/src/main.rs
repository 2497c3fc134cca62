mod config;
mod logging;
mod statsd;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(about = "Forwards inserted lead rows to the CRM contact upsert endpoint")]
struct Cli {
    /// YAML config file. GHL_* and WEBHOOK_SECRET environment variables take precedence.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve webhooks
    Run,
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[derive(thiserror::Error, Debug)]
enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Webhook(#[from] lead_webhook::errors::WebhookError),
}

fn main() {
    let cli = Cli::parse();

    let result = Config::load(cli.config.as_deref())
        .map_err(RelayError::from)
        .and_then(|config| match cli.command {
            CliCommand::Run => run(config),
            CliCommand::CheckConfig => check_config(config),
        });

    // Config errors happen before logging is set up, so report on stderr
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(config: Config) -> Result<(), RelayError> {
    let _sentry_guard = logging::init(config.common.logging.as_ref())?;

    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)?;
    }

    tracing::info!("Starting lead webhook");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(lead_webhook::run(config.webhook))?;

    Ok(())
}

fn check_config(config: Config) -> Result<(), RelayError> {
    config
        .webhook
        .validate()
        .map_err(lead_webhook::errors::WebhookError::from)?;

    println!("{config:#?}");
    if config.webhook.crm.location_id.is_none() {
        println!("warning: GHL_LOCATION_ID is not set, every upsert will fail");
    }
    if config.webhook.crm.token.is_none() {
        println!("warning: GHL_TOKEN is not set");
    }

    Ok(())
}
