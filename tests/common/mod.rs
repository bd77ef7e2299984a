//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use ola_service::config::ServiceConfig;
use ola_service::{OlaServer, Shutdown};

/// A downstream service that records the headers of every request it sees.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<HeaderMap>>>,
    hits: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> HeaderMap {
        self.seen
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend received no requests")
    }
}

#[derive(Clone)]
struct BackendState {
    seen: Arc<Mutex<Vec<HeaderMap>>>,
    hits: Arc<AtomicUsize>,
    delay: Duration,
    respond: Arc<dyn Fn(usize) -> (StatusCode, String) + Send + Sync>,
}

/// Start a programmable backend serving `path`. `respond` gets the 0-based
/// request count and returns the status and body.
pub async fn start_backend<F>(path: &str, respond: F) -> MockBackend
where
    F: Fn(usize) -> (StatusCode, String) + Send + Sync + 'static,
{
    start_slow_backend(path, Duration::ZERO, respond).await
}

/// Like `start_backend`, but every response is held back for `delay`.
pub async fn start_slow_backend<F>(path: &str, delay: Duration, respond: F) -> MockBackend
where
    F: Fn(usize) -> (StatusCode, String) + Send + Sync + 'static,
{
    let state = BackendState {
        seen: Arc::new(Mutex::new(Vec::new())),
        hits: Arc::new(AtomicUsize::new(0)),
        delay,
        respond: Arc::new(respond),
    };
    let backend = MockBackend {
        addr: "127.0.0.1:0".parse().unwrap(),
        seen: state.seen.clone(),
        hits: state.hits.clone(),
    };

    let app = Router::new()
        .route(path, get(record_and_respond))
        .with_state(state);
    let listener = TcpListener::bind(backend.addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, ..backend }
}

async fn record_and_respond(
    State(state): State<BackendState>,
    headers: HeaderMap,
) -> (StatusCode, [(&'static str, &'static str); 1], String) {
    state.seen.lock().unwrap().push(headers);
    let n = state.hits.fetch_add(1, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    let (status, body) = (state.respond)(n);
    (status, [("content-type", "application/json")], body)
}

/// A loopback address nothing listens on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing both clients at the given base URLs, tuned for fast tests.
pub fn test_config(hola_url: &str, aloha_url: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.identity.hostname = Some("ola-test".into());
    config.observability.metrics_enabled = false;
    for (client, url) in [
        (&mut config.clients.hola, hola_url),
        (&mut config.clients.aloha, aloha_url),
    ] {
        client.base_url = url.to_string();
        client.timeout_ms = 2000;
        client.retries.max_attempts = 1;
        client.circuit_breaker.failure_threshold = 3;
        client.circuit_breaker.reset_timeout_ms = 60_000;
    }
    config
}

/// Serve `config` on an ephemeral port. Returns the address and the handle
/// that stops the server.
pub async fn start_ola(config: ServiceConfig) -> (SocketAddr, Shutdown) {
    let server = OlaServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
