// src/server/handler.rs
use hyper::header::HeaderValue;
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::load_balancer::Dispatcher;
use crate::metrics::{MetricsCollector, Timer};

const X_REQUEST_ID: &str = "x-request-id";

/// Catch-all route: every inbound request goes to the dispatcher.
#[derive(Clone)]
pub struct RequestHandler {
    dispatcher: Arc<Dispatcher>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RequestHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let metrics = self.metrics.clone();

        let request_id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                let id = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&id) {
                    req.headers_mut().insert(X_REQUEST_ID, value);
                }
                id
            });

        let method = req.method().clone();
        let span = tracing::info_span!(
            "request",
            %request_id,
            method = %method,
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                tracing::info!("Received request");
                let timer = Timer::new();

                let response = dispatcher.dispatch(req).await;

                tracing::debug!(status = %response.status(), "Request complete");
                if let Some(metrics) = &metrics {
                    metrics.record_request(method.as_str(), response.status().as_u16(), timer.elapsed());
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
