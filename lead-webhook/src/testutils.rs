use crate::contact::ContactPayload;
use crate::crm::{CrmResponse, CrmTransport};
use crate::errors::UpsertError;
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use serde_json::Value;
use shared::http::{full_body, serve};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::Instant;
use url::Url;

/// In-process transport replaying canned responses. Once the script runs out it answers `200 {}`.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<CrmResponse, UpsertError>>>,
    calls: Mutex<Vec<(Instant, Value)>>,
}

impl ScriptedTransport {
    pub fn new(responses: &[(u16, &str)]) -> Self {
        Self::with_results(
            responses
                .iter()
                .map(|&(status, body)| {
                    Ok(CrmResponse {
                        status: StatusCode::from_u16(status).unwrap(),
                        body: body.to_string(),
                    })
                })
                .collect(),
        )
    }

    /// Script that may also fail at the transport level
    pub fn with_results(results: Vec<Result<CrmResponse, UpsertError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl CrmTransport for ScriptedTransport {
    async fn send(&self, payload: &ContactPayload) -> Result<CrmResponse, UpsertError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), serde_json::to_value(payload).unwrap()));

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(CrmResponse {
            status: StatusCode::OK,
            body: "{}".to_string(),
        }))
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Local HTTP server standing in for the CRM. Answers every request with the same response.
pub struct CrmServer {
    pub url: Url,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CrmServer {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn start_crm_server(status: StatusCode, body: &'static str) -> CrmServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    let port = listener.local_addr().unwrap().port();

    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = requests.clone();

    let service = service_fn(move |req: Request<Incoming>| {
        let captured = captured.clone();
        async move {
            let (parts, incoming) = req.into_parts();
            let bytes = incoming.collect().await.map_err(io::Error::other)?.to_bytes();

            captured.lock().unwrap().push(CapturedRequest {
                method: parts.method,
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                body: bytes,
            });

            let mut response = Response::new(full_body::<io::Error>(body));
            *response.status_mut() = status;
            Ok::<_, io::Error>(response)
        }
    });

    tokio::spawn(serve(listener, service));

    CrmServer {
        url: Url::parse(&format!("http://127.0.0.1:{port}/contacts/upsert")).unwrap(),
        requests,
    }
}

/// Port on 127.0.0.1 with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    listener.local_addr().unwrap().port()
}

/// A real connection-refused error from reqwest
pub async fn transport_error() -> UpsertError {
    let port = closed_port().await;
    let err = reqwest::get(format!("http://127.0.0.1:{port}/"))
        .await
        .unwrap_err();
    UpsertError::Transport(err)
}
