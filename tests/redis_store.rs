//! Integration tests for the Redis store.
//!
//! These tests require a Redis instance running at `redis://127.0.0.1/`.
//! Tests are ignored by default - run with `cargo test --features redis-storage --test redis_store -- --ignored`

#![cfg(feature = "redis-storage")]

use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_ttl::{
    DocumentStore, Entry, ExpirationLevels, Hook, OpError, Options, RawEvent, RedisStore,
    RedisStoreConfig, Severity, StoreError,
};

const URL: &str = "redis://127.0.0.1/";

/// Check if Redis is available before running tests
async fn redis_available() -> bool {
    RedisStore::connect(URL).await.is_ok()
}

/// Remove every key under `prefix`.
async fn clear(prefix: &str) {
    let client = redis::Client::open(URL).expect("valid url");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");
    let keys: Vec<String> = conn.keys(format!("{prefix}*")).await.unwrap_or_default();
    if !keys.is_empty() {
        let _: () = conn.del(keys).await.expect("Failed to clear keys");
    }
}

/// Create a test store with unique prefix
async fn create_test_store(test_name: &str) -> RedisStore {
    let prefix = format!("test:{}:", test_name);
    clear(&prefix).await;
    RedisStore::connect_with_config(URL, RedisStoreConfig { key_prefix: prefix })
        .await
        .expect("Failed to connect to Redis")
}

async fn entries(prefix: &str) -> Vec<(String, i64, Entry)> {
    let client = redis::Client::open(URL).expect("valid url");
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let keys: Vec<String> = conn.keys(format!("{prefix}entry:*")).await.unwrap();
    let mut out = Vec::new();
    for key in keys {
        let doc: String = conn.get(&key).await.unwrap();
        let ttl: i64 = conn.ttl(&key).await.unwrap();
        out.push((key, ttl, serde_json::from_str(&doc).unwrap()));
    }
    out
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_entries_expire_per_level() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available at {URL}");
        return;
    }

    let store = Arc::new(create_test_store("per_level").await);
    let hook = Hook::new(Options::new(store.clone()).with_expiration_levels(
        ExpirationLevels::new()
            .with(Severity::Debug, Duration::from_secs(60))
            .with(Severity::Trace, Duration::ZERO),
    ))
    .unwrap();

    hook.fire(&RawEvent::new(Severity::Debug, "d")).unwrap();
    hook.fire(&RawEvent::new(Severity::Trace, "t")).unwrap();
    hook.fire(&RawEvent::new(Severity::Error, "e").with_error(OpError::new("X", "m", "op")))
        .unwrap();

    let stored = entries("test:per_level:").await;
    assert_eq!(stored.len(), 3);
    for (key, ttl, entry) in stored {
        match entry.level {
            Severity::Debug => assert!(ttl > 0 && ttl <= 60, "{key} ttl {ttl}"),
            Severity::Trace => assert!(ttl <= 1, "{key} ttl {ttl}"),
            Severity::Error => {
                assert_eq!(ttl, -1, "{key} should not expire");
                assert_eq!(entry.error.unwrap().code, "X");
            }
            other => panic!("unexpected level {other}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_indexes_are_shared_and_conflicts_rejected() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let first = create_test_store("indexes").await;
    let levels = ExpirationLevels::new().with(Severity::Info, Duration::from_secs(30));
    first.create_indexes(&levels.build_indexes()).unwrap();
    first.create_indexes(&levels.build_indexes()).unwrap();

    let config = RedisStoreConfig {
        key_prefix: "test:indexes:".to_string(),
    };
    let second = RedisStore::connect_with_config(URL, config).await.unwrap();
    let conflicting = ExpirationLevels::new().with(Severity::Info, Duration::from_secs(90));
    assert!(matches!(
        second.create_indexes(&conflicting.build_indexes()),
        Err(StoreError::Rejected(_))
    ));

    let client = redis::Client::open(URL).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let recorded: HashMap<String, u64> = conn.hgetall("test:indexes:indexes").await.unwrap();
    assert_eq!(recorded.get("ttl-info"), Some(&30));
}

#[test]
#[ignore] // Requires Redis
fn test_store_works_outside_runtime() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let Some(store) = rt.block_on(async {
        if redis_available().await {
            Some(create_test_store("sync").await)
        } else {
            None
        }
    }) else {
        eprintln!("Skipping test: Redis not available");
        return;
    };

    // Called from a plain thread while `rt` keeps the connection driven.
    let handle = std::thread::spawn(move || {
        let hook = Hook::new(Options::new(Arc::new(store))).unwrap();
        hook.fire(&RawEvent::new(Severity::Info, "from a thread")).unwrap();
    });
    handle.join().unwrap();

    let stored = rt.block_on(entries("test:sync:"));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].2.message, "from a thread");
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_current_thread_runtime_reports_instead_of_panicking() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("current_thread").await;
    let hook = Hook::new(Options::new(Arc::new(store.clone())).with_expiration_levels(
        ExpirationLevels::new().with(Severity::Info, Duration::from_secs(30)),
    ));
    assert!(matches!(hook, Err(ref e) if e.is_index()));

    let result = store.insert(&Entry::new(Severity::Info, chrono::Utc::now(), "lost"));
    assert!(matches!(result, Err(StoreError::CurrentThreadRuntime)));
    assert!(entries("test:current_thread:").await.is_empty());
}
