use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// CRM contact upsert endpoint
pub const DEFAULT_UPSERT_URL: &str = "https://services.leadconnectorhq.com/contacts/upsert";
/// Value of the `Version` header when none is configured
pub const DEFAULT_API_VERSION: &str = "2021-07-28";

pub const ENV_LOCATION_ID: &str = "GHL_LOCATION_ID";
pub const ENV_TOKEN: &str = "GHL_TOKEN";
pub const ENV_VERSION: &str = "GHL_VERSION";
pub const ENV_WEBHOOK_SECRET: &str = "WEBHOOK_SECRET";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Retry schedule must contain at least one attempt")]
    EmptyRetrySchedule,

    #[error("Invalid retryable status code: {0}")]
    InvalidStatusCode(u16),

    #[error("CRM timeout must be at least one second")]
    InvalidTimeout,
}

/// String that never shows up in `Debug` output
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Lead webhook configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Listener receiving database webhooks
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for `/health` and `/ready`
    #[serde(default)]
    pub admin_listener: Option<Listener>,
    #[serde(default)]
    pub crm: CrmConfig,
    /// Expected value of the `x-webhook-secret` header. Unset disables the check.
    #[serde(default)]
    pub webhook_secret: Option<Secret>,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Overrides file values with the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overrides file values with whatever `lookup` returns. Empty values count as unset.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(location_id) = lookup(ENV_LOCATION_ID) {
            self.crm.location_id = Some(location_id);
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.crm.token = Some(Secret(token));
        }
        if let Some(version) = lookup(ENV_VERSION) {
            self.crm.version = version;
        }
        if let Some(secret) = lookup(ENV_WEBHOOK_SECRET) {
            self.webhook_secret = Some(Secret(secret));
        }

        // An empty value in the file means the same as a missing one
        self.crm.location_id = self.crm.location_id.take().filter(|id| !id.is_empty());
        self.crm.token = self.crm.token.take().filter(|token| !token.is_empty());
        self.webhook_secret = self.webhook_secret.take().filter(|secret| !secret.is_empty());
        if self.crm.version.is_empty() {
            self.crm.version = DEFAULT_API_VERSION.to_string();
        }
    }

    /// Validates the webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        if let Some(admin_listener) = &self.admin_listener {
            admin_listener.validate()?;
        }
        self.crm.validate()?;
        self.retry.validate()?;

        if self.crm.location_id.is_none() {
            tracing::warn!("{ENV_LOCATION_ID} is not set, every upsert will fail");
        }
        if self.crm.token.is_none() {
            tracing::warn!("{ENV_TOKEN} is not set, CRM requests are sent without credentials");
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Outbound CRM settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CrmConfig {
    #[serde(default = "default_upsert_url")]
    pub url: Url,
    /// Bearer token
    #[serde(default)]
    pub token: Option<Secret>,
    /// Sent as the `Version` header
    #[serde(default = "default_api_version")]
    pub version: String,
    /// Tenant every contact is created in. Required for upserts.
    #[serde(default)]
    pub location_id: Option<String>,
    /// Per-attempt timeout. Unset waits for the upstream indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        CrmConfig {
            url: default_upsert_url(),
            token: None,
            version: default_api_version(),
            location_id: None,
            timeout_secs: None,
        }
    }
}

impl CrmConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        // A zero timeout would fail every request before it is sent
        if self.timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_upsert_url() -> Url {
    Url::parse(DEFAULT_UPSERT_URL).expect("default upsert URL is valid")
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Attempt schedule for the upsert call
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Wait before each attempt, in milliseconds. One entry per attempt.
    #[serde(default = "default_delays_ms")]
    pub delays_ms: Vec<u64>,
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            delays_ms: default_delays_ms(),
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.delays_ms.is_empty() {
            return Err(ValidationError::EmptyRetrySchedule);
        }
        for &code in &self.retryable_statuses {
            if http::StatusCode::from_u16(code).is_err() {
                return Err(ValidationError::InvalidStatusCode(code));
            }
        }
        Ok(())
    }
}

fn default_delays_ms() -> Vec<u64> {
    vec![0, 600, 1500]
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}
