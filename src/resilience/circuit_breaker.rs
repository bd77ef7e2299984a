//! Circuit breaker for downstream service protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls get the fallback immediately
//! - Half-Open: testing if downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: after reset timeout
//! Half-Open → Closed: probe call succeeds
//! Half-Open → Open: probe call fails
//! Half-Open → Half-Open: probe cancelled, the next call probes
//! ```
//!
//! # Design Decisions
//! - One breaker per downstream service
//! - Single probe in Half-Open
//! - Admission is an RAII permit, so a cancelled call cannot hold the probe slot
//! - The lock is never held across an await point

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Per-service circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    service: String,
    enabled: bool,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(service: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        Self {
            service: service.into(),
            enabled: config.enabled,
            failure_threshold: config.failure_threshold.max(1),
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Admit a call, or `None` while the circuit is open.
    ///
    /// In Half-Open only one caller is admitted until its permit is settled
    /// or dropped.
    pub fn try_acquire(&self) -> Option<CircuitPermit<'_>> {
        if !self.enabled {
            return Some(CircuitPermit::new(self, false));
        }

        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => Some(CircuitPermit::new(self, false)),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.reset_timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.probe_in_flight = true;
                    Some(CircuitPermit::new(self, true))
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    None
                } else {
                    inner.probe_in_flight = true;
                    Some(CircuitPermit::new(self, true))
                }
            }
        }
    }

    fn on_success(&self) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.consecutive_failures = 0;
        inner.probe_in_flight = false;
        if inner.state != CircuitState::Closed {
            inner.opened_at = None;
            self.transition(&mut inner, CircuitState::Closed);
        }
    }

    fn on_failure(&self) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.probe_in_flight = false;

        match inner.state {
            CircuitState::Closed if inner.consecutive_failures >= self.failure_threshold => {
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::HalfOpen => {
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            _ => {}
        }
    }

    /// Free the half-open slot of a probe that ended without an outcome.
    fn abandon_probe(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        if inner.state == CircuitState::HalfOpen && inner.probe_in_flight {
            inner.probe_in_flight = false;
            tracing::debug!(service = %self.service, "Half-open probe abandoned");
        }
    }

    pub fn state(&self) -> CircuitState {
        if !self.enabled {
            return CircuitState::Closed;
        }
        self.inner.lock().expect("circuit breaker mutex poisoned").state
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        match to {
            CircuitState::Open => tracing::warn!(
                service = %self.service,
                from = ?from,
                failures = inner.consecutive_failures,
                "Circuit opened"
            ),
            _ => tracing::info!(service = %self.service, from = ?from, to = ?to, "Circuit state changed"),
        }
        metrics::record_circuit_state(&self.service, to);
    }
}

/// Admission to call the downstream service.
///
/// Settle it with [`record_success`](Self::record_success) or
/// [`record_failure`](Self::record_failure). A half-open probe dropped
/// unsettled (caller cancelled) releases its slot so the next call can probe.
#[must_use]
#[derive(Debug)]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success();
    }

    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_failure();
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            self.breaker.abandon_probe();
        }
    }
}
