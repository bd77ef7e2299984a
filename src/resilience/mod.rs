//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to downstream service:
//!     → bulkhead.rs (reject when too many calls are in flight)
//!     → circuit_breaker.rs (fail fast to the fallback when open)
//!     → timeouts.rs (one deadline for the whole call)
//!     → On connect error: retries.rs + backoff.rs (retry with jitter)
//!     → circuit_breaker.rs (record outcome)
//! ```
//!
//! # Design Decisions
//! - Every rejection path ends in the configured fallback, never an error
//! - Retries only for failures that never reached the downstream service
//! - Circuit breaker prevents cascading failures

pub mod backoff;
pub mod bulkhead;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use bulkhead::Bulkhead;
pub use circuit_breaker::{CircuitBreaker, CircuitPermit, CircuitState};
pub use retries::RetryPolicy;
pub use timeouts::{with_deadline, DeadlineExceeded};
