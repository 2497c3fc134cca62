use crate::config::{CrmConfig, Secret};
use crate::contact::{ContactPayload, record_keys};
use crate::errors::UpsertError;
use crate::metrics_defs::{UPSERT_ATTEMPTS, UPSERT_FAILURES};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use http::StatusCode;
use http::header::ACCEPT;
use serde_json::{Map, Value, json};
use shared::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Status and raw body of one CRM call
#[derive(Clone, Debug, PartialEq)]
pub struct CrmResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends a single upsert request. Retrying is left to [`Upserter`].
#[async_trait]
pub trait CrmTransport: Send + Sync {
    async fn send(&self, payload: &ContactPayload) -> Result<CrmResponse, UpsertError>;
}

#[async_trait]
impl<T: CrmTransport + ?Sized> CrmTransport for Arc<T> {
    async fn send(&self, payload: &ContactPayload) -> Result<CrmResponse, UpsertError> {
        (**self).send(payload).await
    }
}

/// `reqwest` based transport for the contact upsert endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    token: Option<Secret>,
    version: String,
}

impl HttpTransport {
    pub fn new(config: &CrmConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        Ok(HttpTransport {
            client: builder.build()?,
            url: config.url.clone(),
            token: config.token.clone(),
            version: config.version.clone(),
        })
    }
}

#[async_trait]
impl CrmTransport for HttpTransport {
    async fn send(&self, payload: &ContactPayload) -> Result<CrmResponse, UpsertError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header("Version", self.version.as_str())
            .header(ACCEPT, "application/json")
            .json(payload);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(CrmResponse { status, body })
    }
}

/// Turns lead records into contact upserts, retrying transient CRM failures.
pub struct Upserter<T> {
    transport: T,
    location_id: Option<String>,
    policy: RetryPolicy,
}

impl<T: CrmTransport> Upserter<T> {
    pub fn new(transport: T, location_id: Option<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            location_id,
            policy,
        }
    }

    /// Upserts the contact described by `record` and returns the CRM's parsed response.
    pub async fn upsert(&self, record: &Value) -> Result<Value, UpsertError> {
        let result = self.try_upsert(record).await;
        if let Err(e) = &result {
            counter!(UPSERT_FAILURES, "kind" => e.kind()).increment(1);
        }
        result
    }

    async fn try_upsert(&self, record: &Value) -> Result<Value, UpsertError> {
        let location_id = self
            .location_id
            .as_deref()
            .ok_or(UpsertError::MissingLocationId)?;

        let payload = ContactPayload::from_record(record, location_id)?;

        tracing::debug!(keys = ?record_keys(record), "Lead record keys");
        tracing::info!(
            payload = %serde_json::to_string(&payload).unwrap_or_default(),
            "Sending contact upsert"
        );

        let mut delays = self.policy.delays().iter();
        let mut attempt = 0;

        loop {
            // An empty schedule still makes one immediate attempt
            if let Some(delay) = delays.next()
                && !delay.is_zero()
            {
                sleep(*delay).await;
            }

            attempt += 1;
            let response = self.transport.send(&payload).await?;

            tracing::info!(
                attempt,
                status = response.status.as_u16(),
                body = %response.body,
                "CRM response"
            );
            counter!(UPSERT_ATTEMPTS, "status" => response.status.as_u16().to_string())
                .increment(1);

            if response.status.is_success() {
                return Ok(parse_success_body(&response.body));
            }

            let CrmResponse { status, body } = response;

            if !self.policy.is_retryable(status) {
                return Err(UpsertError::Upstream { status, body });
            }

            if delays.len() == 0 {
                return Err(UpsertError::RetriesExhausted {
                    status,
                    body,
                    attempts: attempt,
                });
            }
        }
    }
}

/// Parses a 2xx body: `{}` when empty, `{"raw": text}` when not JSON.
pub fn parse_success_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Object(Map::new());
    }

    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}
