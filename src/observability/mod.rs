//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → propagation.rs (snapshot headers, copy tracing headers onto outbound calls)
//!
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing backend, via the headers downstream services receive
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows to every downstream call
//! - No span exporter here; trace headers are forwarded untouched

pub mod logging;
pub mod metrics;
pub mod propagation;

pub use propagation::{HeaderPropagator, InboundHeaders, TRACING_HEADERS};
