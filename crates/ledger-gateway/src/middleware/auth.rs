//! Profile resolution middleware.
//!
//! Reads the `profile_id` header, resolves it through the ledger's
//! Authorization Guard and attaches the resulting [`Caller`] to the request.
//! Requests without a resolvable profile are answered with an empty 401 and
//! never reach a handler.

use crate::ApiError;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use ledger_core::{LedgerApi, Profile};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::debug;

/// Header carrying the caller credential.
pub const PROFILE_HEADER: &str = "profile_id";

/// Authenticated caller, available to handlers as an `Extension`.
#[derive(Clone, Debug)]
pub struct Caller(pub Profile);

/// Profile resolution layer
#[derive(Clone)]
pub struct ProfileLayer {
    api: Arc<dyn LedgerApi>,
}

impl ProfileLayer {
    pub fn new(api: Arc<dyn LedgerApi>) -> Self {
        Self { api }
    }
}

impl<S> Layer<S> for ProfileLayer {
    type Service = ProfileService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProfileService {
            inner,
            api: Arc::clone(&self.api),
        }
    }
}

/// Profile resolution service
#[derive(Clone)]
pub struct ProfileService<S> {
    inner: S,
    api: Arc<dyn LedgerApi>,
}

impl<S> Service<Request<Body>> for ProfileService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let api = Arc::clone(&self.api);
        let mut inner = self.inner.clone();
        let credential = credential_from_request(&req);

        Box::pin(async move {
            let resolved =
                tokio::task::spawn_blocking(move || api.authenticate(credential.as_deref())).await;

            match resolved {
                Ok(Ok(profile)) => {
                    debug!(profile_id = %profile.id, "Caller resolved");
                    req.extensions_mut().insert(Caller(profile));
                    inner.call(req).await
                }
                Ok(Err(e)) => Ok(ApiError::from(e).into_response()),
                Err(join) => Ok(ApiError::internal(join).into_response()),
            }
        })
    }
}

/// Header value as text; a non-UTF-8 value counts as absent.
fn credential_from_request<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(PROFILE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
