//! Fallback and circuit breaker behaviour of the downstream clients.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;

use ola_service::client::{ClientBuilder, ClientError, RemoteService};
use ola_service::config::{CircuitBreakerConfig, RetryConfig};
use ola_service::observability::{HeaderPropagator, InboundHeaders};
use ola_service::resilience::CircuitState;

mod common;

fn fallback() -> Vec<String> {
    vec!["Hola response (fallback)".to_string()]
}

#[tokio::test]
async fn test_unreachable_service_returns_fallback() {
    let dead = common::closed_addr().await;
    let aloha = common::start_backend("/api/aloha-chaining", |_| {
        (StatusCode::OK, r#"["Aloha"]"#.to_string())
    })
    .await;
    let (ola_addr, shutdown) = common::start_ola(common::test_config(
        &format!("http://{}/", dead),
        &aloha.base_url(),
    ))
    .await;

    let res = common::client()
        .get(format!("http://{}/api/ola-chaining", ola_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let greetings: Vec<String> = res.json().await.unwrap();
    assert_eq!(greetings, vec!["Olá de ola-test", "Hola response (fallback)"]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_error_status_returns_fallback() {
    let hola = common::start_backend("/api/hola-chaining", |_| {
        (StatusCode::SERVICE_UNAVAILABLE, "down".to_string())
    })
    .await;
    let service = ClientBuilder::new("hola")
        .base_url(hola.base_url())
        .path("/api/hola-chaining")
        .fallback(fallback())
        .build()
        .unwrap();

    let res = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(res, fallback());
    assert_eq!(hola.hits(), 1);
}

#[tokio::test]
async fn test_circuit_opens_and_stops_calling() {
    let hola = common::start_backend("/api/hola-chaining", |_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string())
    })
    .await;
    let service = ClientBuilder::new("hola")
        .base_url(hola.base_url())
        .path("/api/hola-chaining")
        .fallback(fallback())
        .circuit_breaker(CircuitBreakerConfig {
            enabled: true,
            failure_threshold: 3,
            reset_timeout_ms: 60_000,
        })
        .build()
        .unwrap();

    for _ in 0..3 {
        assert_eq!(service.call(&InboundHeaders::empty()).await.unwrap(), fallback());
    }
    assert_eq!(service.circuit_state(), CircuitState::Open);
    assert_eq!(hola.hits(), 3);

    for _ in 0..5 {
        assert_eq!(service.call(&InboundHeaders::empty()).await.unwrap(), fallback());
    }
    assert_eq!(hola.hits(), 3, "open circuit must not reach the backend");
}

#[tokio::test]
async fn test_circuit_recovers_after_reset_timeout() {
    let hola = common::start_backend("/api/hola-chaining", |n| {
        if n < 2 {
            (StatusCode::BAD_GATEWAY, "boom".to_string())
        } else {
            (StatusCode::OK, r#"["Hola de hola-1"]"#.to_string())
        }
    })
    .await;
    let service = ClientBuilder::new("hola")
        .base_url(hola.base_url())
        .path("/api/hola-chaining")
        .fallback(fallback())
        .circuit_breaker(CircuitBreakerConfig {
            enabled: true,
            failure_threshold: 2,
            reset_timeout_ms: 100,
        })
        .build()
        .unwrap();

    service.call(&InboundHeaders::empty()).await.unwrap();
    service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(service.circuit_state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let res = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(res, vec!["Hola de hola-1"]);
    assert_eq!(service.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_cancelled_half_open_call_does_not_wedge_circuit() {
    let hola = common::start_slow_backend("/api/hola-chaining", Duration::from_millis(300), |n| {
        if n == 0 {
            (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string())
        } else {
            (StatusCode::OK, r#"["Hola de hola-1"]"#.to_string())
        }
    })
    .await;
    let service = Arc::new(
        ClientBuilder::new("hola")
            .base_url(hola.base_url())
            .path("/api/hola-chaining")
            .fallback(fallback())
            .circuit_breaker(CircuitBreakerConfig {
                enabled: true,
                failure_threshold: 1,
                reset_timeout_ms: 50,
            })
            .build()
            .unwrap(),
    );

    assert_eq!(service.call(&InboundHeaders::empty()).await.unwrap(), fallback());
    assert_eq!(service.circuit_state(), CircuitState::Open);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The half-open trial call is cancelled mid-flight, as when the inbound
    // client disconnects.
    let trial = {
        let service = service.clone();
        tokio::spawn(async move { service.call(&InboundHeaders::empty()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    trial.abort();
    let _ = trial.await;
    assert_eq!(hola.hits(), 2);

    let res = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(res, vec!["Hola de hola-1"]);
    assert_eq!(service.circuit_state(), CircuitState::Closed);
    assert_eq!(hola.hits(), 3);
}

#[tokio::test]
async fn test_slow_service_hits_deadline() {
    let hola = common::start_slow_backend("/api/hola-chaining", Duration::from_millis(300), |_| {
        (StatusCode::OK, r#"["late"]"#.to_string())
    })
    .await;
    let service = ClientBuilder::new("hola")
        .base_url(hola.base_url())
        .path("/api/hola-chaining")
        .fallback(fallback())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let started = Instant::now();
    let res = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(res, fallback());
    assert!(started.elapsed() < Duration::from_millis(290));
}

#[tokio::test]
async fn test_connect_errors_are_retried() {
    let dead = common::closed_addr().await;
    let service = ClientBuilder::new("hola")
        .base_url(format!("http://{}/", dead))
        .path("/api/hola-chaining")
        .fallback(fallback())
        .retry(&RetryConfig {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 50,
        })
        .build()
        .unwrap();

    let started = Instant::now();
    let res = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(res, fallback());
    // Two backoff sleeps between three attempts.
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_undecodable_body_is_an_error() {
    let hola = common::start_backend("/api/hola-chaining", |_| {
        (StatusCode::OK, "not json".to_string())
    })
    .await;
    let service = ClientBuilder::new("hola")
        .base_url(hola.base_url())
        .path("/api/hola-chaining")
        .interceptor(Arc::new(HeaderPropagator::default()))
        .fallback(fallback())
        .build()
        .unwrap();

    let err = service.call(&InboundHeaders::empty()).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
    assert_eq!(service.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_undecodable_body_maps_to_bad_gateway() {
    let hola = common::start_backend("/api/hola-chaining", |_| {
        (StatusCode::OK, r#"{"not":"a list"}"#.to_string())
    })
    .await;
    let (ola_addr, shutdown) =
        common::start_ola(common::test_config(&hola.base_url(), &hola.base_url())).await;

    let res = common::client()
        .get(format!("http://{}/api/ola-chaining", ola_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY.as_u16());

    shutdown.trigger();
}

#[tokio::test]
async fn test_bulkhead_rejects_excess_calls() {
    let hola = common::start_slow_backend("/api/hola-chaining", Duration::from_millis(200), |_| {
        (StatusCode::OK, r#"["Hola de hola-1"]"#.to_string())
    })
    .await;
    let service = Arc::new(
        ClientBuilder::new("hola")
            .base_url(hola.base_url())
            .path("/api/hola-chaining")
            .fallback(fallback())
            .max_concurrent(1)
            .build()
            .unwrap(),
    );

    let slow = {
        let service = service.clone();
        tokio::spawn(async move { service.call(&InboundHeaders::empty()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let rejected = service.call(&InboundHeaders::empty()).await.unwrap();
    assert_eq!(rejected, fallback());

    let first = slow.await.unwrap().unwrap();
    assert_eq!(first, vec!["Hola de hola-1"]);
    assert_eq!(hola.hits(), 1);
}
