//! Integration tests for the GCRA limiter.
//!
//! These tests require Docker (via testcontainers) and start a real Redis
//! instance for each test.
//!
//! Run with: `cargo test --test redis_gcra`

use ratelimit_redis::{Factory, RateLimiter, StoreConfig};
use std::time::Duration;

use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

async fn start_redis() -> (Factory, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379_u16.tcp())
        .start()
        .await
        .expect("failed to start redis container");

    let host = container.get_host().await.expect("get host");
    let port = container.get_host_port_ipv4(6379).await.expect("get port");

    let factory = Factory::connect(StoreConfig::new(format!("redis://{host}:{port}")))
        .await
        .expect("connect to redis");

    (factory, container)
}

#[tokio::test]
async fn admits_exactly_the_derived_limit_then_denies() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.gcra();

    // rate=5/s, window=1s -> limit = floor(5*1) = 5
    for i in 1..=5 {
        let decision = limiter.attempt("client:1", 0, 5.0, 1).await.unwrap();
        assert!(decision.allowed(), "request {i} should be admitted");
    }

    assert!(!limiter.attempt("client:1", 0, 5.0, 1).await.unwrap().allowed());
}

#[tokio::test]
async fn spacing_requests_by_separation_keeps_admitting() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.gcra();

    // limit = 2, separation = window/limit = 0.5s.
    for _ in 0..4 {
        let decision = limiter.attempt("client:2", 0, 2.0, 1).await.unwrap();
        assert!(decision.allowed());
        tokio::time::sleep(Duration::from_millis(550)).await;
    }
}

#[tokio::test]
async fn reset_clears_the_tracked_arrival_time() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.gcra();

    for _ in 0..3 {
        limiter.attempt("client:3", 0, 3.0, 1).await.unwrap();
    }
    assert!(!limiter.attempt("client:3", 0, 3.0, 1).await.unwrap().allowed());

    limiter.reset("client:3").await.unwrap();

    assert!(limiter.attempt("client:3", 0, 3.0, 1).await.unwrap().allowed());
}
