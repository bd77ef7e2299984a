//! Trace context propagation.
//!
//! # Responsibilities
//! - Capture the inbound request's headers for the duration of a handler
//! - Copy allow-listed tracing headers onto outgoing requests
//!
//! # Design Decisions
//! - Headers are copied opaquely; nothing here parses B3 or OpenTracing values
//! - Header names are `http::HeaderName`, so matching is case-insensitive
//! - A header already set on the outgoing request is never overwritten
//! - The inbound snapshot is passed explicitly, there is no task-local registry
//! - Copied headers are logged at debug, not info

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, HeaderName, InvalidHeaderName};
use axum::http::request::Parts;

use crate::client::RequestInterceptor;

/// Tracing headers forwarded to downstream services, in processing order.
pub const TRACING_HEADERS: [&str; 7] = [
    "x-request-id",
    "x-b3-traceid",
    "x-b3-spanid",
    "x-b3-parentspanid",
    "x-b3-sampled",
    "x-b3-flags",
    "x-ot-span-context",
];

/// Read-only snapshot of the headers on the request currently being handled.
#[derive(Debug, Clone, Default)]
pub struct InboundHeaders(HeaderMap);

impl InboundHeaders {
    /// Snapshot for calls made outside an inbound request.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }
}

impl From<HeaderMap> for InboundHeaders {
    fn from(headers: HeaderMap) -> Self {
        Self(headers)
    }
}

impl<S> FromRequestParts<S> for InboundHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.headers.clone()))
    }
}

/// Copies an allow-list of headers from the inbound request to outgoing ones.
#[derive(Debug, Clone)]
pub struct HeaderPropagator {
    names: Vec<HeaderName>,
}

impl HeaderPropagator {
    /// Build a propagator for the given header names.
    ///
    /// Fails if any name is not a valid HTTP header name.
    pub fn new<I, S>(names: I) -> Result<Self, InvalidHeaderName>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| HeaderName::from_bytes(name.as_ref().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names })
    }

    /// The allow-list, in processing order.
    pub fn names(&self) -> &[HeaderName] {
        &self.names
    }

    /// Copy every allow-listed header present in `inbound` and absent from
    /// `outgoing` onto `outgoing`, keeping all of its values.
    pub fn propagate(&self, outgoing: &mut HeaderMap, inbound: &HeaderMap) {
        for name in &self.names {
            if outgoing.contains_key(name) {
                continue;
            }

            let values = inbound.get_all(name);
            if values.iter().next().is_none() {
                continue;
            }

            tracing::debug!(
                header = %name,
                values = ?values.iter().collect::<Vec<_>>(),
                "Adding tracing header"
            );
            for value in values {
                outgoing.append(name.clone(), value.clone());
            }
        }
    }
}

impl Default for HeaderPropagator {
    fn default() -> Self {
        Self {
            names: TRACING_HEADERS
                .into_iter()
                .map(HeaderName::from_static)
                .collect(),
        }
    }
}

impl RequestInterceptor for HeaderPropagator {
    fn apply(&self, request: &mut reqwest::Request, inbound: &InboundHeaders) {
        self.propagate(request.headers_mut(), inbound.headers());
    }
}
