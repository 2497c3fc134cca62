use crate::config::ValidationError;
use http::StatusCode;
use thiserror::Error;

/// Result type alias for lead-webhook operations
pub type Result<T, E = WebhookError> = std::result::Result<T, E>;

/// Errors raised while turning a lead record into a CRM contact
#[derive(Error, Debug)]
pub enum UpsertError {
    #[error("Missing GHL_LOCATION_ID: no CRM location id configured")]
    MissingLocationId,

    #[error("Validation: need at least email or phone")]
    MissingContactInfo,

    /// Non-retryable status from the CRM
    #[error("GHL {}: {}", .status.as_u16(), .body)]
    Upstream { status: StatusCode, body: String },

    /// Every attempt ended with a retryable status
    #[error("GHL {}: {}", .status.as_u16(), .body)]
    RetriesExhausted {
        status: StatusCode,
        body: String,
        attempts: usize,
    },

    #[error("CRM request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpsertError {
    /// Short label used to tag metrics
    pub fn kind(&self) -> &'static str {
        match self {
            UpsertError::MissingLocationId => "config",
            UpsertError::MissingContactInfo => "validation",
            UpsertError::Upstream { .. } => "upstream",
            UpsertError::RetriesExhausted { .. } => "retries_exhausted",
            UpsertError::Transport(_) => "transport",
        }
    }
}

/// Errors that can occur while serving webhooks
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Upsert(#[from] UpsertError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
