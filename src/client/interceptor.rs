//! Pre-send hooks for outgoing requests.

use crate::observability::propagation::InboundHeaders;

/// Mutates an outgoing request immediately before it is dispatched.
///
/// Interceptors run in registration order, once per attempt, and must not
/// fail: anything they cannot apply is skipped.
pub trait RequestInterceptor: Send + Sync {
    fn apply(&self, request: &mut reqwest::Request, inbound: &InboundHeaders);
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut reqwest::Request, &InboundHeaders) + Send + Sync,
{
    fn apply(&self, request: &mut reqwest::Request, inbound: &InboundHeaders) {
        self(request, inbound)
    }
}
