//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check header names and URLs parse
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::{ClientConfig, ServiceConfig};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid propagation header name '{0}'")]
    InvalidHeaderName(String),

    #[error("client '{client}': invalid url '{value}': {reason}")]
    InvalidUrl {
        client: &'static str,
        value: String,
        reason: String,
    },

    #[error("client '{client}': {field} must be greater than zero")]
    Zero {
        client: &'static str,
        field: &'static str,
    },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for name in &config.propagation.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    validate_client("hola", &config.clients.hola, &mut errors);
    validate_client("aloha", &config.clients.aloha, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_client(client: &'static str, config: &ClientConfig, errors: &mut Vec<ValidationError>) {
    if !config.enabled {
        return;
    }

    match Url::parse(&config.base_url) {
        Ok(base) => {
            if let Err(e) = base.join(&config.path) {
                errors.push(ValidationError::InvalidUrl {
                    client,
                    value: config.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
        Err(e) => errors.push(ValidationError::InvalidUrl {
            client,
            value: config.base_url.clone(),
            reason: e.to_string(),
        }),
    }

    let zero_checks = [
        ("timeout_ms", config.timeout_ms == 0),
        ("connect_timeout_ms", config.connect_timeout_ms == 0),
        ("max_concurrent", config.max_concurrent == 0),
        ("retries.max_attempts", config.retries.max_attempts == 0),
        (
            "circuit_breaker.failure_threshold",
            config.circuit_breaker.enabled && config.circuit_breaker.failure_threshold == 0,
        ),
    ];
    for (field, is_zero) in zero_checks {
        if is_zero {
            errors.push(ValidationError::Zero { client, field });
        }
    }
}
