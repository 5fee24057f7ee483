//! Integration tests for the concurrency-aware composer.
//!
//! These tests require Docker (via testcontainers) and start a real Redis
//! instance for each test.
//!
//! Run with: `cargo test --test redis_composer`

use ratelimit_redis::decision::RejectionCause;
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
async fn gate_exhaustion_is_reported_without_touching_the_base_limiter() {
    let (factory, _container) = start_redis().await;
    let composer = factory.with_concurrency(factory.token_bucket());

    let d1 = composer
        .attempt_with_concurrency("job:1", "req-1", 1, 100, 100.0, 1, 30)
        .await
        .unwrap();
    assert!(d1.is_allowed());

    let d2 = composer
        .attempt_with_concurrency("job:1", "req-2", 1, 100, 100.0, 1, 30)
        .await
        .unwrap();

    assert!(!d2.is_allowed());
    assert_eq!(d2.into_record().rejection_cause, RejectionCause::GateExhausted);

    // The base limiter's full budget is untouched: req-1 is still the
    // only admission it has ever recorded.
    let token_bucket = factory.token_bucket();
    let remaining = token_bucket.remaining("job:1", 100, 100.0, 1).await.unwrap();
    assert_eq!(remaining, 99);
}

#[tokio::test]
async fn rate_denial_releases_the_gate_slot() {
    let (factory, _container) = start_redis().await;
    let composer = factory.with_concurrency(factory.token_bucket());

    // burst=1 so the second call is denied by the base limiter, not the gate.
    composer
        .attempt_with_concurrency("job:2", "req-1", 5, 1, 1.0, 60, 30)
        .await
        .unwrap();

    let denied = composer
        .attempt_with_concurrency("job:2", "req-2", 5, 1, 1.0, 60, 30)
        .await
        .unwrap();

    assert!(!denied.is_allowed());
    assert_eq!(denied.into_record().rejection_cause, RejectionCause::RateExceeded);

    // The gate slot taken for req-2 must have been released immediately.
    let in_flight = composer.current_in_flight("job:2", 30).await.unwrap();
    assert_eq!(in_flight, 1);
}

#[tokio::test]
async fn pure_gate_mode_skips_the_base_limiter_entirely() {
    use ratelimit_redis::TokenBucket;

    let (factory, _container) = start_redis().await;
    let composer = factory.gate_only::<TokenBucket>();

    let allowed = composer
        .attempt_with_concurrency("job:3", "req-1", 2, 0, 1.0, 1, 30)
        .await
        .unwrap();
    assert!(allowed.is_allowed());

    let also_allowed = composer
        .attempt_with_concurrency("job:3", "req-2", 2, 0, 1.0, 1, 30)
        .await
        .unwrap();
    assert!(also_allowed.is_allowed());

    let denied = composer
        .attempt_with_concurrency("job:3", "req-3", 2, 0, 1.0, 1, 30)
        .await
        .unwrap();
    assert!(!denied.is_allowed());
    assert_eq!(denied.into_record().rejection_cause, RejectionCause::GateExhausted);
}
