//! Summary Cache Tests
//!
//! ## Scenarios Covered
//!
//! 1. Round-trip and hit bookkeeping
//! 2. Disabled mode
//! 3. Lazy TTL expiry and eager purge
//! 4. Capacity eviction (oldest first)
//! 5. Backend failures downgrade to misses

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use infralens_core::cache::{BackendResult, CacheBackend, CacheEntry, MemoryBackend, SummaryCache};
use infralens_core::config::{CacheConfig, NarrativeConfig};
use infralens_core::errors::{ExError, ExErrorKind};
use infralens_core::parse::parse_diff;
use infralens_core::Fingerprint;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn fingerprint(stack: &str) -> Fingerprint {
    let cs = parse_diff(&json!({ stack: { "create": true } })).unwrap();
    Fingerprint::compute(&cs, &NarrativeConfig::default()).unwrap()
}

#[test]
fn test_store_then_lookup_returns_text_exactly() {
    let backend = Arc::new(MemoryBackend::new());
    let cache = SummaryCache::new(backend.clone(), &CacheConfig::default(), common::manual_clock());
    let fp = fingerprint("A");
    let text = "## Summary\n\nUnicode ✓ and trailing spaces  ";

    assert_eq!(cache.lookup(&fp), None);
    cache.store(&fp, text);
    assert_eq!(cache.lookup(&fp).as_deref(), Some(text));
    assert_eq!(cache.lookup(&fp).as_deref(), Some(text));

    let entry = backend.read(&fp).unwrap().unwrap();
    assert_eq!(entry.access_count, 2);
}

#[test]
fn test_miss_does_not_create_entry() {
    let backend = Arc::new(MemoryBackend::new());
    let cache = SummaryCache::new(backend.clone(), &CacheConfig::default(), common::manual_clock());
    assert_eq!(cache.lookup(&fingerprint("A")), None);
    assert!(backend.keys().unwrap().is_empty());
}

#[test]
fn test_store_overwrites_and_resets_bookkeeping() {
    let backend = Arc::new(MemoryBackend::new());
    let cache = SummaryCache::new(backend.clone(), &CacheConfig::default(), common::manual_clock());
    let fp = fingerprint("A");

    cache.store(&fp, "first");
    cache.lookup(&fp);
    cache.store(&fp, "second");

    let entry = backend.read(&fp).unwrap().unwrap();
    assert_eq!(entry.narrative, "second");
    assert_eq!(entry.access_count, 0);
}

#[test]
fn test_disabled_cache_always_misses() {
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    let cache = SummaryCache::new(Arc::new(MemoryBackend::new()), &config, common::manual_clock());
    let fp = fingerprint("A");

    cache.store(&fp, "text");
    cache.store(&fp, "text");
    assert_eq!(cache.lookup(&fp), None);
    assert_eq!(cache.purge_expired(), 0);
    assert!(!cache.stats().enabled);
}

#[test]
fn test_entries_expire_after_ttl() {
    let clock = common::manual_clock();
    let config = CacheConfig {
        ttl_hours: 1,
        ..CacheConfig::default()
    };
    let cache = SummaryCache::new(Arc::new(MemoryBackend::new()), &config, clock.clone());
    let fresh = fingerprint("Fresh");
    let stale = fingerprint("Stale");

    cache.store(&stale, "old");
    clock.advance(Duration::from_secs(30 * 60));
    cache.store(&fresh, "new");
    clock.advance(Duration::from_secs(30 * 60));

    assert_eq!(cache.lookup(&stale), None);
    assert_eq!(cache.lookup(&fresh).as_deref(), Some("new"));

    let stats = cache.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.expired, 1);

    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.stats().entries, 1);
}

#[test]
fn test_capacity_evicts_oldest_first() {
    let clock = common::manual_clock();
    let config = CacheConfig {
        max_size_mb: 1,
        ..CacheConfig::default()
    };
    let cache = SummaryCache::new(Arc::new(MemoryBackend::new()), &config, clock.clone());
    let half = "x".repeat(512 * 1024);

    let first = fingerprint("First");
    let second = fingerprint("Second");
    let third = fingerprint("Third");

    cache.store(&first, &half);
    clock.advance(Duration::from_secs(1));
    cache.store(&second, &half);
    clock.advance(Duration::from_secs(1));
    cache.store(&third, &half);

    assert_eq!(cache.lookup(&first), None);
    assert!(cache.lookup(&second).is_some());
    assert!(cache.lookup(&third).is_some());
    assert!(cache.stats().total_bytes <= 1024 * 1024);
}

#[test]
fn test_invalidate_and_clear() {
    let cache = SummaryCache::new(
        Arc::new(MemoryBackend::new()),
        &CacheConfig::default(),
        common::manual_clock(),
    );
    let a = fingerprint("A");
    let b = fingerprint("B");
    cache.store(&a, "a");
    cache.store(&b, "b");

    assert!(cache.invalidate(&a));
    assert!(!cache.invalidate(&a));
    assert_eq!(cache.lookup(&a), None);
    assert_eq!(cache.clear(), 1);
    assert_eq!(cache.lookup(&b), None);
}

/// Backend whose reads always fail as corrupt and whose writes fail as I/O
struct BrokenBackend;

impl CacheBackend for BrokenBackend {
    fn read(&self, fingerprint: &Fingerprint) -> BackendResult<Option<CacheEntry>> {
        Err(ExError::new(ExErrorKind::CacheCorrupt)
            .with_op("cache_read")
            .with_entity_id(fingerprint.as_str())
            .with_message("truncated document"))
    }

    fn write(&self, _entry: &CacheEntry) -> BackendResult<()> {
        Err(ExError::new(ExErrorKind::Io).with_message("read-only filesystem"))
    }

    fn remove(&self, _fingerprint: &Fingerprint) -> BackendResult<bool> {
        Ok(true)
    }

    fn keys(&self) -> BackendResult<Vec<Fingerprint>> {
        Ok(vec![fingerprint("A")])
    }
}

#[test]
fn test_backend_errors_are_misses_not_failures() {
    let cache = SummaryCache::new(Arc::new(BrokenBackend), &CacheConfig::default(), common::manual_clock());
    let fp = fingerprint("A");

    cache.store(&fp, "text");
    assert_eq!(cache.lookup(&fp), None);

    let stats = cache.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.corrupt, 1);

    // corrupt entries are purged
    assert_eq!(cache.purge_expired(), 1);
}

#[test]
fn test_concurrent_store_and_lookup() {
    let cache = Arc::new(SummaryCache::new(
        Arc::new(MemoryBackend::new()),
        &CacheConfig::default(),
        common::manual_clock(),
    ));
    let fp = fingerprint("Shared");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            let fp = fp.clone();
            std::thread::spawn(move || {
                cache.store(&fp, &format!("writer {}", i));
                cache.lookup(&fp)
            })
        })
        .collect();

    for handle in handles {
        let seen = handle.join().unwrap().unwrap();
        assert!(seen.starts_with("writer "));
    }
}
