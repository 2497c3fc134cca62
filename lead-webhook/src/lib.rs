pub mod config;
pub mod contact;
pub mod crm;
pub mod errors;
pub mod event;
pub mod handler;
pub mod metrics_defs;
pub mod retry;

#[cfg(test)]
mod testutils;

use crate::crm::{CrmTransport, HttpTransport, Upserter};
use crate::errors::{Result, WebhookError};
use crate::handler::{HandlerBody, WebhookHandler};
use crate::retry::RetryPolicy;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<()> {
    config.validate()?;

    let transport = HttpTransport::new(&config.crm)
        .map_err(|e| WebhookError::HttpClientError(e.to_string()))?;
    let upserter = Upserter::new(
        transport,
        config.crm.location_id.clone(),
        RetryPolicy::from(&config.retry),
    );
    let service = WebhookService::new(WebhookHandler::new(
        upserter,
        config.webhook_secret.clone(),
    ));

    let webhook_task = run_http_service(&config.listener.host, config.listener.port, service);

    match &config.admin_listener {
        Some(admin_listener) => {
            let admin_task = run_http_service(
                &admin_listener.host,
                admin_listener.port,
                AdminService::<_, WebhookError>::new(|| true),
            );
            tokio::try_join!(webhook_task, admin_task)?;
        }
        None => webhook_task.await?,
    }

    Ok(())
}

/// Hyper service wrapping a shared [`WebhookHandler`]
pub struct WebhookService<T> {
    handler: Arc<WebhookHandler<T>>,
}

impl<T> WebhookService<T> {
    pub fn new(handler: WebhookHandler<T>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<T> Service<Request<Incoming>> for WebhookService<T>
where
    T: CrmTransport + 'static,
{
    type Response = Response<HandlerBody>;
    type Error = WebhookError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}
