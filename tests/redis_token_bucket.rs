//! Integration tests for the token bucket limiter.
//!
//! These tests require Docker (via testcontainers) and start a real Redis
//! instance for each test.
//!
//! Run with: `cargo test --test redis_token_bucket`

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
async fn burst_drains_the_bucket_then_denies() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.token_bucket();

    for i in 1..=5 {
        let decision = limiter.attempt("caller:1", 5, 1.0, 1).await.unwrap();
        assert!(decision.allowed(), "request {i} should be admitted");
    }

    assert!(!limiter.attempt("caller:1", 5, 1.0, 1).await.unwrap().allowed());
}

#[tokio::test]
async fn tight_loop_never_exceeds_burst_despite_fractional_refill() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.token_bucket();

    let mut admitted = 0;
    for _ in 0..200 {
        if limiter.attempt("caller:2", 3, 1.0, 1).await.unwrap().allowed() {
            admitted += 1;
        }
    }

    // The anti-thrash refill floor prevents the bucket from admitting
    // substantially more than the declared burst under a tight loop.
    assert!(admitted <= 5, "admitted {admitted} requests, expected close to burst");
}

#[tokio::test]
async fn refills_after_waiting() {
    let (factory, _container) = start_redis().await;
    let limiter = factory.token_bucket();

    for _ in 0..2 {
        limiter.attempt("caller:3", 2, 2.0, 1).await.unwrap();
    }
    assert!(!limiter.attempt("caller:3", 2, 2.0, 1).await.unwrap().allowed());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(limiter.attempt("caller:3", 2, 2.0, 1).await.unwrap().allowed());
}
