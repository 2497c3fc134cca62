use crate::config::Secret;
use crate::crm::{CrmTransport, Upserter};
use crate::errors::WebhookError;
use crate::event::InsertEvent;
use crate::metrics_defs::{REQUEST_DURATION, WEBHOOK_REQUESTS};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes};
use serde_json::{Value, json};
use shared::http::{full_body, make_boxed_error_response};
use shared::{counter, histogram};
use std::fmt::Display;
use std::time::Instant;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "x-webhook-secret";

pub type HandlerBody = BoxBody<Bytes, WebhookError>;

/// What happened to a webhook request
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Upserted; carries the CRM response
    Processed(Value),
    /// Not an insert event; acknowledged and dropped
    Ignored,
    /// Wrong method or secret; the body was never read
    Rejected(StatusCode),
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Processed(_) => "processed",
            Outcome::Ignored => "ignored",
            Outcome::Rejected(_) => "rejected",
        }
    }
}

/// Validates a database webhook and forwards the inserted record to the CRM.
pub struct WebhookHandler<T> {
    upserter: Upserter<T>,
    secret: Option<Secret>,
}

impl<T: CrmTransport> WebhookHandler<T> {
    pub fn new(upserter: Upserter<T>, secret: Option<Secret>) -> Self {
        Self { upserter, secret }
    }

    /// Handles one request. Errors never escape: they become a 500 JSON envelope.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<HandlerBody>
    where
        B: Body,
        B::Error: Display,
    {
        let start = Instant::now();

        let (label, response) = match self.process(req).await {
            Ok(outcome) => {
                let label = outcome.label();
                let response = match outcome {
                    Outcome::Processed(result) => {
                        json_response(StatusCode::OK, &json!({ "ok": true, "result": result }))
                    }
                    Outcome::Ignored => Response::new(full_body("Ignored")),
                    Outcome::Rejected(status) => make_boxed_error_response(status),
                };
                (label, response)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to process webhook");
                let body = json!({ "ok": false, "error": e.to_string() });
                ("failed", json_response(StatusCode::INTERNAL_SERVER_ERROR, &body))
            }
        };

        counter!(WEBHOOK_REQUESTS, "outcome" => label).increment(1);
        histogram!(REQUEST_DURATION, "outcome" => label).record(start.elapsed().as_secs_f64());

        response
    }

    pub async fn process<B>(&self, req: Request<B>) -> Result<Outcome, WebhookError>
    where
        B: Body,
        B::Error: Display,
    {
        if req.method() != Method::POST {
            return Ok(Outcome::Rejected(StatusCode::METHOD_NOT_ALLOWED));
        }

        if let Some(expected) = &self.secret {
            let provided = req
                .headers()
                .get(SECRET_HEADER)
                .and_then(|value| value.to_str().ok());

            if provided != Some(expected.expose()) {
                tracing::warn!("Rejected webhook with missing or invalid secret");
                return Ok(Outcome::Rejected(StatusCode::UNAUTHORIZED));
            }
        }

        let bytes = req
            .into_body()
            .collect()
            .await
            .map_err(|e| WebhookError::RequestBodyError(e.to_string()))?
            .to_bytes();
        let payload: Value = serde_json::from_slice(&bytes)?;

        let Some(event) = InsertEvent::from_payload(&payload) else {
            tracing::info!(payload = %payload, "Ignored payload");
            return Ok(Outcome::Ignored);
        };

        tracing::debug!(
            table = event.table,
            schema = event.schema,
            "Received insert event"
        );

        let result = self.upserter.upsert(event.record).await?;
        Ok(Outcome::Processed(result))
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<HandlerBody> {
    let mut response = Response::new(full_body(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
