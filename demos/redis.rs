//! Example persisting tracing events to Redis.
//!
//! Entries of levels with a retention get a key TTL; the rest are kept until
//! deleted.
//!
//! # Quick Start
//!
//! 1. Start Redis:
//!    ```bash
//!    docker run -p 6379:6379 redis:7-alpine
//!    ```
//!
//! 2. Run the example (from project root):
//!    ```bash
//!    cargo run --example redis --features redis-storage
//!    ```
//!
//! 3. Inspect what was written:
//!    ```bash
//!    redis-cli --scan --pattern 'tracing-ttl-demo:*'
//!    redis-cli ttl <key>
//!    ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::prelude::*;
use tracing_ttl::{
    ExpirationLevels, Hook, OpError, Options, PersistLayer, RedisStore, RedisStoreConfig,
    Severity,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RedisStoreConfig {
        key_prefix: "tracing-ttl-demo:".to_string(),
    };

    println!("Connecting to Redis at redis://127.0.0.1/...");
    let store = match RedisStore::connect_with_config("redis://127.0.0.1/", config).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to connect to Redis: {e}");
            eprintln!("Start one with: docker run -p 6379:6379 redis:7-alpine");
            return Err(e.into());
        }
    };

    let hook = Hook::new(Options::new(Arc::new(store)).with_expiration_levels(
        ExpirationLevels::new()
            .with(Severity::Debug, Duration::from_secs(30))
            .with(Severity::Info, Duration::from_secs(3600)),
    ))?;

    let layer = PersistLayer::new(hook).with_error_handler(|err| {
        eprintln!("entry lost: {err}");
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(layer)
        .init();

    debug!(step = 1, "expires in 30 seconds");
    info!(step = 2, "expires in an hour");

    let err = OpError::internal("connection reset", "payment failed", "Billing.Charge");
    error!(error = &err as &dyn std::error::Error, "kept until deleted");

    println!("\nDone. Debug entries disappear after 30 seconds.");
    Ok(())
}
