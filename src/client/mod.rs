//! Outbound client subsystem.
//!
//! # Data Flow
//! ```text
//! Handler (with InboundHeaders snapshot)
//!     → RemoteService::call
//!         HttpService: bulkhead → circuit breaker → deadline
//!             → build request → interceptors (tracing headers) → send
//!             → 2xx body → JSON decode
//!             → on failure: fallback value
//!         StaticFallback: fallback value
//! ```
//!
//! # Design Decisions
//! - Each downstream service is built from an explicit `ClientConfig`;
//!   there is no global registry of clients
//! - Interceptors are trait objects so any pre-send hook can be registered

pub mod builder;
pub mod downstream;
pub mod error;
pub mod interceptor;
pub mod service;

pub use builder::ClientBuilder;
pub use downstream::{aloha_service, hola_service, GreetingService, Greetings};
pub use error::ClientError;
pub use interceptor::RequestInterceptor;
pub use service::{HttpService, RemoteService, StaticFallback};
