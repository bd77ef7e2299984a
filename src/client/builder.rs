//! Builder for circuit-broken HTTP proxies.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::client::error::ClientError;
use crate::client::interceptor::RequestInterceptor;
use crate::client::service::HttpService;
use crate::config::{CircuitBreakerConfig, ClientConfig, RetryConfig};
use crate::resilience::{Bulkhead, CircuitBreaker, RetryPolicy};

/// Assembles an [`HttpService`] from a base URL, a path, interceptors,
/// resilience settings and a fallback value.
pub struct ClientBuilder<T> {
    name: String,
    base_url: String,
    path: String,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    fallback: Option<T>,
    timeout: Duration,
    connect_timeout: Duration,
    max_concurrent: usize,
    circuit_breaker: CircuitBreakerConfig,
    retry: RetryPolicy,
}

impl<T> ClientBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: String::new(),
            path: String::new(),
            interceptors: Vec::new(),
            fallback: None,
            timeout: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(500),
            max_concurrent: 10,
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::none(),
        }
    }

    /// Seed every setting except the fallback and interceptors from config.
    pub fn from_config(name: impl Into<String>, config: &ClientConfig) -> Self {
        Self::new(name)
            .base_url(&config.base_url)
            .path(&config.path)
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .max_concurrent(config.max_concurrent)
            .circuit_breaker(config.circuit_breaker.clone())
            .retry(&config.retries)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Register a pre-send hook. Hooks run in registration order.
    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }

    pub fn retry(mut self, config: &RetryConfig) -> Self {
        self.retry = RetryPolicy::from(config);
        self
    }

    /// Build the proxy. Without an explicit fallback, `T::default()` is used.
    pub fn build(self) -> Result<HttpService<T>, ClientError>
    where
        T: Default,
    {
        let url = Url::parse(&self.base_url)
            .and_then(|base| base.join(&self.path))
            .map_err(|source| ClientError::InvalidUrl {
                service: self.name.clone(),
                source,
            })?;

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                service: self.name.clone(),
                source,
            })?;

        tracing::info!(
            service = %self.name,
            url = %url,
            timeout_ms = self.timeout.as_millis() as u64,
            circuit_breaker = self.circuit_breaker.enabled,
            "Remote service configured"
        );

        Ok(HttpService {
            breaker: CircuitBreaker::new(self.name.clone(), &self.circuit_breaker),
            bulkhead: Bulkhead::new(self.max_concurrent),
            name: self.name,
            url,
            client,
            interceptors: self.interceptors,
            fallback: self.fallback.unwrap_or_default(),
            timeout: self.timeout,
            retry: self.retry,
        })
    }
}
