//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::propagation::TRACING_HEADERS;

/// Root configuration for the ola service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How this instance names itself in greetings.
    pub identity: IdentityConfig,

    /// Inbound request timeouts.
    pub timeouts: TimeoutConfig,

    /// Which headers are forwarded to downstream services.
    pub propagation: PropagationConfig,

    /// Downstream greeting services.
    pub clients: ClientsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Host name used in "Olá de {hostname}". Falls back to `$HOSTNAME`.
    pub hostname: Option<String>,
}

impl IdentityConfig {
    pub fn resolve_hostname(&self) -> String {
        self.hostname
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Header propagation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Header names copied from the inbound request to outgoing calls.
    pub headers: Vec<String>,

    /// Generate an `x-request-id` for inbound requests that lack one.
    pub generate_request_id: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            headers: TRACING_HEADERS.iter().map(|h| h.to_string()).collect(),
            generate_request_id: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    pub hola: ClientConfig,
    pub aloha: ClientConfig,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            hola: ClientConfig::new(
                "http://hola:8080/",
                "/api/hola-chaining",
                "Hola response (fallback)",
            ),
            aloha: ClientConfig::new(
                "http://aloha:8080/",
                "/api/aloha-chaining",
                "Aloha response (fallback)",
            ),
        }
    }
}

/// One downstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// When false, calls return the fallback without touching the network.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the service (e.g., "http://hola:8080/").
    pub base_url: String,

    /// Path of the chaining endpoint, joined onto `base_url`.
    pub path: String,

    /// Response used when the call fails or the circuit is open.
    pub fallback: Vec<String>,

    /// Execution deadline for a whole call, retries included.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// TCP connect timeout per attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum in-flight calls before falling back.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub retries: RetryConfig,
}

impl ClientConfig {
    pub fn new(base_url: &str, path: &str, fallback: &str) -> Self {
        Self {
            enabled: true,
            base_url: base_url.to_string(),
            path: path.to_string(),
            fallback: vec![fallback.to_string()],
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_concurrent: default_max_concurrent(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retries: RetryConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    500
}

fn default_max_concurrent() -> usize {
    10
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,

    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a probe is allowed.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout_ms: 5000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
