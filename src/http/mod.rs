//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → handlers.rs (greeting endpoints)
//!         → client (hola / aloha, with the inbound headers snapshot)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, OlaServer, ServerError};
