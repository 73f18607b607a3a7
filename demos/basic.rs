//! Basic example persisting tracing events with per-level retention.
//!
//! Debug entries are kept for a minute and errors for a day; everything else
//! never expires. The in-memory store stands in for a real document store and
//! runs its expiry pass on demand.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_ttl::{
    ExpirationLevels, Hook, MemoryStore, OpError, Options, PersistLayer, RawEvent, Severity,
};

fn main() {
    let store = Arc::new(MemoryStore::new());
    let hook = Hook::new(
        Options::new(store.clone())
            .with_expiration_levels(
                ExpirationLevels::new()
                    .with(Severity::Debug, Duration::from_secs(60))
                    .with(Severity::Error, Duration::from_secs(24 * 3600)),
            )
            .with_fire_hook(|entry| {
                println!("  -> persisting {} entry: {:?}", entry.level, entry.message);
            }),
    )
    .expect("Failed to build hook");

    // Print to the console and persist at the same time
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(PersistLayer::new(hook.clone()))
        .init();

    println!("=== Basic Persistence Example ===\n");

    debug!(cache = "users", hit = true, "cache lookup");
    info!(user = "alice", "logged in");
    warn!(retries = 3, "upstream slow");

    let err = OpError::new("NOT_FOUND", "user missing", "Users.Get").with_source("no rows");
    error!(error = &err as &dyn std::error::Error, "lookup failed");

    // Levels tracing cannot express go through the hook directly
    hook.fire(&RawEvent::new(Severity::Fatal, "shutting down"))
        .expect("Failed to persist entry");

    println!("\nStored entries:");
    for entry in store.entries() {
        println!(
            "  {}",
            serde_json::to_string(&entry).expect("Failed to encode entry")
        );
    }

    let purged = store.purge_expired(Utc::now() + chrono::Duration::minutes(5));
    println!("\nFive minutes later the expiry pass removes {purged} entries.");
    println!("{} entries remain.", store.len());

    println!("\n=== Example Complete ===");
}
