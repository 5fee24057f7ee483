//! Cross-cutting properties that apply to every algorithm: key isolation,
//! reset idempotence, and transparent recovery from a flushed script
//! cache.
//!
//! These tests require Docker (via testcontainers) and start a real Redis
//! instance for each test.
//!
//! Run with: `cargo test --test redis_properties`

use deadpool_redis::redis::cmd;
use ratelimit_redis::{Factory, RateLimiter, StoreConfig};

use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

async fn start_redis() -> (Factory, String, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379_u16.tcp())
        .start()
        .await
        .expect("failed to start redis container");

    let host = container.get_host().await.expect("get host");
    let port = container.get_host_port_ipv4(6379).await.expect("get port");
    let url = format!("redis://{host}:{port}");

    let factory = Factory::connect(StoreConfig::new(&url))
        .await
        .expect("connect to redis");

    (factory, url, container)
}

#[tokio::test]
async fn operations_on_one_key_never_mutate_a_sibling_key() {
    let (factory, _url, _container) = start_redis().await;

    let gcra = factory.gcra();
    gcra.attempt("k1", 0, 5.0, 1).await.unwrap();
    gcra.attempt("k1", 0, 5.0, 1).await.unwrap();
    let k2_remaining_before = gcra.remaining("k2", 0, 5.0, 1).await.unwrap();
    assert_eq!(k2_remaining_before, 5, "k2 untouched by k1's admissions");

    let token = factory.token_bucket();
    token.attempt("t1", 10, 1.0, 1).await.unwrap();
    token.attempt("t1", 10, 1.0, 1).await.unwrap();
    let t2_remaining = token.remaining("t2", 10, 1.0, 1).await.unwrap();
    assert_eq!(t2_remaining, 10, "t2 untouched by t1's admissions");

    let gate = factory.concurrency_gate();
    gate.try_acquire("g1", "req-1", 2, 30).await.unwrap();
    let g2_current = gate.current("g2", 30).await.unwrap();
    assert_eq!(g2_current, 0, "g2's gate untouched by g1's acquire");
}

#[tokio::test]
async fn reset_is_idempotent_and_a_fresh_key_behaves_like_new() {
    let (factory, _url, _container) = start_redis().await;
    let limiter = factory.fixed_window();

    for _ in 0..3 {
        limiter.attempt("reset:1", 3, 1.0, 60).await.unwrap();
    }
    assert!(!limiter.attempt("reset:1", 3, 1.0, 60).await.unwrap().allowed());

    let first_reset = limiter.reset("reset:1").await.unwrap();
    assert!(first_reset >= 1);

    let second_reset = limiter.reset("reset:1").await.unwrap();
    assert_eq!(second_reset, 0, "resetting an already-clean key removes nothing");

    // Fresh key: attempt behaves exactly as it did before any prior usage.
    for i in 1..=3 {
        let decision = limiter.attempt("reset:1", 3, 1.0, 60).await.unwrap();
        assert!(decision.allowed(), "post-reset request {i} should be admitted");
    }
    assert!(!limiter.attempt("reset:1", 3, 1.0, 60).await.unwrap().allowed());
}

#[tokio::test]
async fn admission_survives_a_flushed_script_cache() {
    let (factory, url, _container) = start_redis().await;
    let limiter = factory.sliding_window();

    // Warm the cache with a first admission, then flush it out from under
    // the executor's memo using a separate connection. The next call
    // through `factory` must reload-on-miss transparently rather than
    // surface a NOSCRIPT error to the caller.
    assert!(limiter.attempt("cache:1", 0, 5.0, 60).await.unwrap().allowed());

    let flush_pool = deadpool_redis::Config::from_url(&url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("build flush pool");
    let mut flush_conn = flush_pool.get().await.expect("get flush connection");
    let _: () = cmd("SCRIPT")
        .arg("FLUSH")
        .query_async(&mut flush_conn)
        .await
        .expect("flush script cache");

    let decision = limiter.attempt("cache:1", 0, 5.0, 60).await;
    assert!(decision.is_ok(), "reload-on-miss should make the flush invisible to the caller");
    assert!(decision.unwrap().allowed());
}
