//! Content-addressed narrative cache
//!
//! [`SummaryCache`] sits in front of the narrative call. It never fails:
//! every backend error is logged and downgraded to a miss (on read) or
//! ignored (on write). Disabled mode is a state of the cache itself, so
//! callers never branch on whether caching is on.
//!
//! Storage is delegated to a [`CacheBackend`]: [`MemoryBackend`] here, a
//! filesystem backend in `infralens-store`.

pub mod entry;
pub mod memory;

pub use entry::CacheEntry;
pub use memory::MemoryBackend;

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::errors::ExError;
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, ExError>;

/// Storage medium for cache entries.
///
/// Implementations must be safe under concurrent `read`/`write` from
/// several threads; concurrent writes to one key resolve last-writer-wins.
pub trait CacheBackend: Send + Sync {
    /// `Ok(None)` if absent; `Err` (usually `ERR_CACHE_CORRUPT`) if the
    /// stored bytes cannot be decoded.
    fn read(&self, fingerprint: &Fingerprint) -> BackendResult<Option<CacheEntry>>;

    /// Insert or overwrite
    fn write(&self, entry: &CacheEntry) -> BackendResult<()>;

    /// `Ok(true)` if an entry was removed
    fn remove(&self, fingerprint: &Fingerprint) -> BackendResult<bool>;

    /// Every stored key, readable or not, in sorted order
    fn keys(&self) -> BackendResult<Vec<Fingerprint>>;
}

/// Snapshot of cache contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub expired: usize,
    pub corrupt: usize,
    pub total_bytes: u64,
    pub max_size_bytes: u64,
    pub total_hits: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

struct Enabled {
    backend: Arc<dyn CacheBackend>,
    ttl: chrono::Duration,
    max_size_bytes: u64,
}

enum Mode {
    Enabled(Enabled),
    Disabled,
}

pub struct SummaryCache {
    mode: Mode,
    clock: Arc<dyn Clock>,
}

impl SummaryCache {
    /// Build a cache over `backend`. When `config.enabled` is false the
    /// backend is never touched.
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let mode = if config.enabled {
            Mode::Enabled(Enabled {
                backend,
                ttl: config.ttl(),
                max_size_bytes: config.max_size_bytes(),
            })
        } else {
            Mode::Disabled
        };
        Self { mode, clock }
    }

    /// A cache where every lookup misses and every store is a no-op
    pub fn disabled(clock: Arc<dyn Clock>) -> Self {
        Self {
            mode: Mode::Disabled,
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Enabled(_))
    }

    /// Cached narrative for `fingerprint`, if present and fresh.
    ///
    /// A hit bumps the hit counter and last-access time; a miss leaves
    /// storage untouched.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<String> {
        let Mode::Enabled(enabled) = &self.mode else {
            return None;
        };

        let mut entry = match enabled.backend.read(fingerprint) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn_downgraded("cache_lookup", fingerprint, &err);
                return None;
            }
        };

        let now = self.clock.now();
        if entry.is_expired(now, enabled.ttl) {
            tracing::debug!(
                component = module_path!(),
                op = "cache_lookup",
                fingerprint = %fingerprint,
                "cache entry expired"
            );
            return None;
        }

        entry.record_hit(now);
        if let Err(err) = enabled.backend.write(&entry) {
            warn_downgraded("cache_touch", fingerprint, &err);
        }
        Some(entry.narrative)
    }

    /// Store `narrative` under `fingerprint`, replacing any previous entry,
    /// then evict other entries down to capacity. The new entry is never
    /// evicted by its own store, even when it alone exceeds the capacity.
    pub fn store(&self, fingerprint: &Fingerprint, narrative: &str) {
        let Mode::Enabled(enabled) = &self.mode else {
            return;
        };

        let entry = CacheEntry::new(fingerprint.clone(), narrative, self.clock.now());
        if let Err(err) = enabled.backend.write(&entry) {
            warn_downgraded("cache_store", fingerprint, &err);
            return;
        }
        self.evict_over_capacity(enabled, Some(fingerprint));
    }

    /// Drop one entry. Returns whether something was removed.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let Mode::Enabled(enabled) = &self.mode else {
            return false;
        };
        enabled.backend.remove(fingerprint).unwrap_or_else(|err| {
            warn_downgraded("cache_invalidate", fingerprint, &err);
            false
        })
    }

    /// Drop every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        self.remove_where(|_| true)
    }

    /// Drop expired and unreadable entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let Mode::Enabled(enabled) = &self.mode else {
            return 0;
        };
        let now = self.clock.now();
        let ttl = enabled.ttl;
        self.remove_where(|slot| match slot {
            Slot::Entry(entry) => entry.is_expired(now, ttl),
            Slot::Corrupt => true,
        })
    }

    /// Evict oldest entries until the stored narrative bytes fit the
    /// configured capacity. Returns the number evicted.
    pub fn enforce_capacity(&self) -> usize {
        let Mode::Enabled(enabled) = &self.mode else {
            return 0;
        };
        self.evict_over_capacity(enabled, None)
    }

    fn evict_over_capacity(&self, enabled: &Enabled, keep: Option<&Fingerprint>) -> usize {
        let mut entries: Vec<CacheEntry> = self
            .scan(enabled)
            .into_iter()
            .filter_map(|(_, slot)| match slot {
                Slot::Entry(entry) => Some(entry),
                Slot::Corrupt => None,
            })
            .collect();
        let mut total: u64 = entries.iter().map(CacheEntry::size_bytes).sum();
        if total <= enabled.max_size_bytes {
            return 0;
        }

        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });

        let mut evicted = 0;
        for entry in entries {
            if total <= enabled.max_size_bytes {
                break;
            }
            if keep == Some(&entry.fingerprint) {
                continue;
            }
            match enabled.backend.remove(&entry.fingerprint) {
                Ok(_) => {
                    total = total.saturating_sub(entry.size_bytes());
                    evicted += 1;
                }
                Err(err) => warn_downgraded("cache_evict", &entry.fingerprint, &err),
            }
        }

        if evicted > 0 {
            tracing::info!(
                component = module_path!(),
                op = "cache_evict",
                evicted = evicted,
                remaining_bytes = total,
                "cache evicted entries over capacity"
            );
        }
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let Mode::Enabled(enabled) = &self.mode else {
            return CacheStats::default();
        };

        let now = self.clock.now();
        let mut stats = CacheStats {
            enabled: true,
            max_size_bytes: enabled.max_size_bytes,
            ..CacheStats::default()
        };

        for (_, slot) in self.scan(enabled) {
            let entry = match slot {
                Slot::Entry(entry) => entry,
                Slot::Corrupt => {
                    stats.corrupt += 1;
                    continue;
                }
            };
            stats.entries += 1;
            stats.total_bytes += entry.size_bytes();
            stats.total_hits += entry.access_count;
            if entry.is_expired(now, enabled.ttl) {
                stats.expired += 1;
            }
            stats.oldest = Some(stats.oldest.map_or(entry.created_at, |o| o.min(entry.created_at)));
            stats.newest = Some(stats.newest.map_or(entry.created_at, |n| n.max(entry.created_at)));
        }
        stats
    }

    fn scan(&self, enabled: &Enabled) -> Vec<(Fingerprint, Slot)> {
        let keys = match enabled.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "cache_scan",
                    err_code = err.code(),
                    error = %err,
                    "cache listing failed; treating cache as empty"
                );
                return Vec::new();
            }
        };

        keys.into_iter()
            .filter_map(|fp| match enabled.backend.read(&fp) {
                Ok(Some(entry)) => Some((fp, Slot::Entry(entry))),
                Ok(None) => None,
                Err(err) => {
                    warn_downgraded("cache_scan", &fp, &err);
                    Some((fp, Slot::Corrupt))
                }
            })
            .collect()
    }

    fn remove_where(&self, predicate: impl Fn(&Slot) -> bool) -> usize {
        let Mode::Enabled(enabled) = &self.mode else {
            return 0;
        };
        self.scan(enabled)
            .into_iter()
            .filter(|(_, slot)| predicate(slot))
            .filter(|(fp, _)| match enabled.backend.remove(fp) {
                Ok(removed) => removed,
                Err(err) => {
                    warn_downgraded("cache_remove", fp, &err);
                    false
                }
            })
            .count()
    }
}

enum Slot {
    Entry(CacheEntry),
    Corrupt,
}

fn warn_downgraded(op: &str, fingerprint: &Fingerprint, err: &ExError) {
    tracing::warn!(
        component = module_path!(),
        op = op,
        fingerprint = %fingerprint,
        err_code = err.code(),
        error = %err,
        "cache backend error downgraded to miss"
    );
}
