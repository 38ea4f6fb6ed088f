//! Filesystem Backend Tests
//!
//! ## Scenarios Covered
//!
//! 1. Metadata round-trips losslessly across backend instances
//! 2. Corrupt or misplaced documents surface as `ERR_CACHE_CORRUPT`
//! 3. `SummaryCache` over the filesystem downgrades corruption to a miss
//! 4. Stray and temp files are ignored by listing
//! 5. Concurrent writers to one key leave one valid document

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use infralens_core::cache::{CacheBackend, CacheEntry, SummaryCache};
use infralens_core::clock::ManualClock;
use infralens_core::config::{CacheConfig, NarrativeConfig};
use infralens_core::errors::ExErrorKind;
use infralens_core::parse::parse_diff;
use infralens_core::Fingerprint;
use infralens_store::FsBackend;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn fingerprint(stack: &str) -> Fingerprint {
    let cs = parse_diff(&json!({ stack: { "update": true } })).unwrap();
    Fingerprint::compute(&cs, &NarrativeConfig::default()).unwrap()
}

fn entry_file(root: &std::path::Path, fp: &Fingerprint) -> std::path::PathBuf {
    root.join(fp.shard()).join(format!("{}.json", fp))
}

#[test]
fn test_metadata_round_trip_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let fp = fingerprint("Api");
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let mut entry = CacheEntry::new(fp.clone(), "# Summary\n\n| a | b |", created);
    entry.record_hit(created + chrono::Duration::minutes(5));
    entry.record_hit(created + chrono::Duration::minutes(9));

    FsBackend::new(temp_dir.path()).write(&entry).unwrap();
    let reopened = FsBackend::new(temp_dir.path());
    let back = reopened.read(&fp).unwrap().unwrap();

    assert_eq!(back, entry);
    assert_eq!(back.access_count, 2);
    assert_eq!(back.created_at, created);
    assert_eq!(reopened.keys().unwrap(), vec![fp]);
}

#[test]
fn test_truncated_document_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsBackend::new(temp_dir.path());
    let fp = fingerprint("Api");
    backend
        .write(&CacheEntry::new(fp.clone(), "text", Utc::now()))
        .unwrap();

    fs::write(entry_file(temp_dir.path(), &fp), b"{\"fingerprint\": \"ab").unwrap();

    let err = backend.read(&fp).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::CacheCorrupt);
    assert_eq!(err.entity_id(), Some(fp.as_str()));
}

#[test]
fn test_document_under_wrong_name_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsBackend::new(temp_dir.path());
    let real = fingerprint("Real");
    let other = fingerprint("Other");

    backend
        .write(&CacheEntry::new(real.clone(), "text", Utc::now()))
        .unwrap();
    let target = entry_file(temp_dir.path(), &other);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::copy(entry_file(temp_dir.path(), &real), &target).unwrap();

    assert_eq!(backend.read(&other).unwrap_err().code(), "ERR_CACHE_CORRUPT");
}

#[test]
fn test_summary_cache_treats_corruption_as_miss() {
    let temp_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = SummaryCache::new(
        Arc::new(FsBackend::new(temp_dir.path())),
        &CacheConfig::default(),
        clock,
    );
    let fp = fingerprint("Api");

    cache.store(&fp, "narrative");
    assert_eq!(cache.lookup(&fp).as_deref(), Some("narrative"));

    fs::write(entry_file(temp_dir.path(), &fp), b"not json at all").unwrap();
    assert_eq!(cache.lookup(&fp), None);
    assert_eq!(cache.stats().corrupt, 1);

    assert_eq!(cache.purge_expired(), 1);
    assert!(!entry_file(temp_dir.path(), &fp).exists());
}

#[test]
fn test_stray_files_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsBackend::new(temp_dir.path());
    let fp = fingerprint("Api");
    backend
        .write(&CacheEntry::new(fp.clone(), "text", Utc::now()))
        .unwrap();

    let shard = temp_dir.path().join(fp.shard());
    fs::write(shard.join("notes.txt"), b"hello").unwrap();
    fs::write(shard.join("short.json"), b"{}").unwrap();
    fs::write(shard.join(format!(".{}.json.abc.tmp", fp)), b"partial").unwrap();
    fs::write(temp_dir.path().join("README"), b"top-level file").unwrap();

    assert_eq!(backend.keys().unwrap(), vec![fp]);
}

#[test]
fn test_ttl_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let config = CacheConfig {
        ttl_hours: 2,
        ..CacheConfig::default()
    };
    let fp = fingerprint("Api");

    let writer_clock = Arc::new(ManualClock::new(start));
    SummaryCache::new(Arc::new(FsBackend::new(temp_dir.path())), &config, writer_clock)
        .store(&fp, "narrative");

    let reader_clock = Arc::new(ManualClock::new(start + chrono::Duration::hours(3)));
    let reader = SummaryCache::new(Arc::new(FsBackend::new(temp_dir.path())), &config, reader_clock);
    assert_eq!(reader.lookup(&fp), None);
    assert_eq!(reader.stats().expired, 1);
}

#[test]
fn test_concurrent_writers_leave_one_valid_document() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(FsBackend::new(temp_dir.path()));
    let fp = fingerprint("Hot");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let backend = backend.clone();
            let fp = fp.clone();
            std::thread::spawn(move || {
                let entry = CacheEntry::new(fp, format!("writer {}", i), Utc::now());
                backend.write(&entry).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entry = backend.read(&fp).unwrap().unwrap();
    assert!(entry.narrative.starts_with("writer "));

    let leftovers = fs::read_dir(temp_dir.path().join(fp.shard()))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}
