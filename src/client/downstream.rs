//! The two downstream greeting services.

use std::sync::Arc;

use crate::client::builder::ClientBuilder;
use crate::client::error::ClientError;
use crate::client::service::{RemoteService, StaticFallback};
use crate::config::ClientConfig;
use crate::observability::propagation::HeaderPropagator;

/// Response of a chaining endpoint: one greeting per hop.
pub type Greetings = Vec<String>;

pub type GreetingService = Arc<dyn RemoteService<Greetings>>;

pub fn hola_service(
    config: &ClientConfig,
    propagator: Arc<HeaderPropagator>,
) -> Result<GreetingService, ClientError> {
    greeting_service("hola", config, propagator)
}

pub fn aloha_service(
    config: &ClientConfig,
    propagator: Arc<HeaderPropagator>,
) -> Result<GreetingService, ClientError> {
    greeting_service("aloha", config, propagator)
}

fn greeting_service(
    name: &str,
    config: &ClientConfig,
    propagator: Arc<HeaderPropagator>,
) -> Result<GreetingService, ClientError> {
    if !config.enabled {
        tracing::info!(service = %name, "Remote service disabled, serving fallback only");
        return Ok(Arc::new(StaticFallback::new(name, config.fallback.clone())));
    }

    let service = ClientBuilder::from_config(name, config)
        .interceptor(propagator)
        .fallback(config.fallback.clone())
        .build()?;
    Ok(Arc::new(service))
}
