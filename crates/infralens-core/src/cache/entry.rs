use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached narrative.
///
/// Only the hit counter and last-access time change after creation.
/// Timestamps serialize as RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub narrative: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, narrative: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            narrative: narrative.into(),
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
        }
    }

    /// Expired once `ttl` has fully elapsed since creation
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        match self.created_at.checked_add_signed(ttl) {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    pub fn record_hit(&mut self, now: DateTime<Utc>) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = now;
    }

    /// Bytes counted against the cache capacity
    pub fn size_bytes(&self) -> u64 {
        self.narrative.len() as u64
    }
}
