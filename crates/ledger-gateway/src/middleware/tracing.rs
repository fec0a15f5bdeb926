//! Request tracing middleware.
//!
//! Opens an `api_request` span per request carrying a request id, the method
//! and path, and records the response status. The request id is echoed in the
//! `x-request-id` response header; an inbound `x-request-id` is reused.

use super::metrics::{LedgerMetrics, RequestTimer};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tracing layer that creates spans for each request
#[derive(Clone, Default)]
pub struct TracingLayer {
    metrics: Option<Arc<LedgerMetrics>>,
}

impl TracingLayer {
    pub fn new() -> Self {
        Self { metrics: None }
    }

    /// Also count requests and latency.
    pub fn with_metrics(metrics: Arc<LedgerMetrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Option<Arc<LedgerMetrics>>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let metrics = self.metrics.clone();

        let request_id = request_id(&req);
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let span = info_span!(
            "api_request",
            request_id = %request_id,
            http.method = %method,
            http.target = %path,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let timer = RequestTimer::start();
                let result = inner.call(req).await;
                let latency_ms = timer.elapsed_ms();

                match result {
                    Ok(mut response) => {
                        let status = response.status();
                        Span::current().record("http.status_code", status.as_u16());
                        info!(status = status.as_u16(), latency_ms, "Request completed");

                        if let Some(metrics) = &metrics {
                            metrics.record_request(
                                status.is_success(),
                                latency_ms,
                            );
                        }
                        if let Ok(value) = HeaderValue::from_str(&request_id) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                        Ok(response)
                    }
                    Err(e) => {
                        if let Some(metrics) = &metrics {
                            metrics.record_request(false, latency_ms);
                        }
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Inbound `x-request-id` if present and printable, else a fresh UUID.
fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
