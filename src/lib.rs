//! Ola greeting service library.
//!
//! Answers greetings and chains calls to the hola and aloha services,
//! forwarding distributed-tracing headers on every outbound call.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::OlaServer;
pub use lifecycle::Shutdown;
