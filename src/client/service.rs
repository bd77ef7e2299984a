//! Remote service proxies.
//!
//! # Responsibilities
//! - Dispatch a typed call to a downstream service
//! - Run registered interceptors before each attempt
//! - Convert transport failures into the configured fallback value
//! - Decode JSON responses into the caller's type
//!
//! # Design Decisions
//! - `HttpService` talks to the network; `StaticFallback` never does
//! - Decode failures surface as errors, they are not masked by the fallback
//! - A decode failure does not count against the circuit: the service answered

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::error::{CallFailure, ClientError};
use crate::client::interceptor::RequestInterceptor;
use crate::observability::metrics;
use crate::observability::propagation::InboundHeaders;
use crate::resilience::{with_deadline, Bulkhead, CircuitBreaker, CircuitState, RetryPolicy};

/// A callable that returns the decoded remote response or a fixed fallback.
#[async_trait]
pub trait RemoteService<T>: Send + Sync {
    /// Service name, used in logs and metrics.
    fn name(&self) -> &str;

    async fn call(&self, inbound: &InboundHeaders) -> Result<T, ClientError>;
}

/// Fallback-only stub: answers every call with the same value.
#[derive(Debug, Clone)]
pub struct StaticFallback<T> {
    name: String,
    value: T,
}

impl<T> StaticFallback<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[async_trait]
impl<T> RemoteService<T> for StaticFallback<T>
where
    T: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, _inbound: &InboundHeaders) -> Result<T, ClientError> {
        metrics::record_outbound(&self.name, "fallback_only", Instant::now());
        Ok(self.value.clone())
    }
}

/// Circuit-broken HTTP proxy for one downstream endpoint.
pub struct HttpService<T> {
    pub(crate) name: String,
    pub(crate) url: Url,
    pub(crate) client: reqwest::Client,
    pub(crate) interceptors: Vec<Arc<dyn RequestInterceptor>>,
    pub(crate) fallback: T,
    pub(crate) timeout: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) breaker: CircuitBreaker,
    pub(crate) bulkhead: Arc<Bulkhead>,
}

impl<T> HttpService<T> {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    fn build_request(&self, inbound: &InboundHeaders) -> Result<reqwest::Request, reqwest::Error> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .build()?;
        for interceptor in &self.interceptors {
            interceptor.apply(&mut request, inbound);
        }
        Ok(request)
    }

    /// Send the request, retrying connect errors, and read a 2xx body.
    async fn execute(&self, inbound: &InboundHeaders) -> Result<Vec<u8>, CallFailure> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let request = self.build_request(inbound)?;
            let started = Instant::now();
            tracing::debug!(service = %self.name, attempt = attempts, "---> GET {}", self.url);

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    tracing::debug!(
                        service = %self.name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "<--- {}",
                        status
                    );
                    if !status.is_success() {
                        return Err(CallFailure::Status(status));
                    }
                    return Ok(response.bytes().await?.to_vec());
                }
                Err(e) => match self.retry.next_delay(attempts, &e) {
                    Some(delay) => {
                        tracing::info!(
                            service = %self.name,
                            attempt = attempts,
                            delay = ?delay,
                            error = %e,
                            "Retrying after connection error"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(CallFailure::Request(e)),
                },
            }
        }
    }

    async fn fetch(&self, inbound: &InboundHeaders) -> Result<Vec<u8>, CallFailure> {
        let _slot = self.bulkhead.try_acquire().ok_or(CallFailure::Saturated)?;
        let permit = self.breaker.try_acquire().ok_or(CallFailure::CircuitOpen)?;

        let result = match with_deadline(self.timeout, self.execute(inbound)).await {
            Ok(result) => result,
            Err(elapsed) => Err(CallFailure::from(elapsed)),
        };
        match &result {
            Ok(_) => permit.record_success(),
            Err(_) => permit.record_failure(),
        }
        result
    }
}

#[async_trait]
impl<T> RemoteService<T> for HttpService<T>
where
    T: DeserializeOwned + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, inbound: &InboundHeaders) -> Result<T, ClientError> {
        let start = Instant::now();
        match self.fetch(inbound).await {
            Ok(body) => {
                let decoded = serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
                    service: self.name.clone(),
                    source,
                });
                let outcome = if decoded.is_ok() { "success" } else { "decode_error" };
                metrics::record_outbound(&self.name, outcome, start);
                decoded
            }
            Err(failure) => {
                if failure.counts_against_circuit() {
                    tracing::warn!(service = %self.name, error = %failure, "Call failed, using fallback");
                } else {
                    tracing::debug!(service = %self.name, reason = %failure, "Call skipped, using fallback");
                }
                metrics::record_outbound(&self.name, failure.outcome(), start);
                Ok(self.fallback.clone())
            }
        }
    }
}

impl<T> std::fmt::Debug for HttpService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpService")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("interceptors", &self.interceptors.len())
            .field("timeout", &self.timeout)
            .field("circuit", &self.breaker.state())
            .finish()
    }
}
