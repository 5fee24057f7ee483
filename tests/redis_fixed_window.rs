//! Integration tests for the fixed window limiter.
//!
//! These tests require Docker (via testcontainers) and start a real Redis
//! instance for each test.
//!
//! Run with: `cargo test --test redis_fixed_window`

use ratelimit_redis::{Factory, RateLimiter, StoreConfig};

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
async fn admits_up_to_burst_then_denies_within_the_slot() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.fixed_window();

    for i in 1..=4 {
        let decision = limiter.attempt("ip:1", 4, 1.0, 60).await.unwrap();
        assert!(decision.allowed(), "request {i} should be admitted");
    }

    let denied = limiter.attempt("ip:1", 4, 1.0, 60).await.unwrap();
    assert!(!denied.allowed());
}

#[tokio::test]
async fn attempts_reports_the_current_counter() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.fixed_window();

    limiter.attempt("ip:2", 10, 1.0, 60).await.unwrap();
    limiter.attempt("ip:2", 10, 1.0, 60).await.unwrap();

    assert_eq!(limiter.attempts("ip:2", 10, 1.0, 60).await.unwrap(), 2);
}

#[tokio::test]
async fn reset_sweeps_every_slot_key_for_the_prefix() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.fixed_window();

    for _ in 0..3 {
        limiter.attempt("ip:3", 3, 1.0, 60).await.unwrap();
    }
    assert!(!limiter.attempt("ip:3", 3, 1.0, 60).await.unwrap().allowed());

    let removed = limiter.reset("ip:3").await.unwrap();
    assert!(removed >= 1);

    assert!(limiter.attempt("ip:3", 3, 1.0, 60).await.unwrap().allowed());
}
