//! End-to-end admission demo against a local Redis.
//!
//! Run with:
//! ```
//! cargo run --example basic_admission
//! ```

use ratelimit_redis::{Factory, RateLimiter, StoreConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = Factory::connect(StoreConfig::new("redis://127.0.0.1:6379")).await?;
    let limiter = factory.gcra();

    println!("=== GCRA admission demo ===");
    println!("rate: 10/s, window: 1s, burst: 5\n");

    for i in 1..=15 {
        let decision = limiter.attempt("demo:user:123", 5, 10.0, 1).await?;

        if decision.allowed() {
            println!("request {i}: allowed (retries_left={})", decision.retries_left);
        } else {
            println!("request {i}: denied (retry_after={}s)", decision.retry_after_seconds);
        }
    }

    println!("\nwaiting 1s for recovery...\n");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let decision = limiter.attempt("demo:user:123", 5, 10.0, 1).await?;
    println!(
        "after recovery: {} (retries_left={})",
        if decision.allowed() { "allowed" } else { "denied" },
        decision.retries_left
    );

    println!("\n=== Concurrency-aware composition ===");
    let composed = factory.with_concurrency(factory.token_bucket());

    let d1 = composed
        .attempt_with_concurrency("demo:upload", "req-1", 2, 20, 5.0, 1, 30)
        .await?;
    let d2 = composed
        .attempt_with_concurrency("demo:upload", "req-2", 2, 20, 5.0, 1, 30)
        .await?;
    let d3 = composed
        .attempt_with_concurrency("demo:upload", "req-3", 2, 20, 5.0, 1, 30)
        .await?;

    println!("req-1: {:?}", d1.into_record().rejection_cause);
    println!("req-2: {:?}", d2.into_record().rejection_cause);
    println!("req-3: {:?}", d3.into_record().rejection_cause);

    composed.release_concurrency("demo:upload", "req-1").await?;
    println!("\nreleased req-1, in-flight now: {}", composed.current_in_flight("demo:upload", 30).await?);

    Ok(())
}
