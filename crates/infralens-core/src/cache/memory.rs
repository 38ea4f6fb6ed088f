use super::{BackendResult, CacheBackend};
use crate::cache::CacheEntry;
use crate::errors::{ExError, ExErrorKind};
use crate::fingerprint::Fingerprint;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-process cache backend. Entries live as long as the backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, op: &str) -> BackendResult<MutexGuard<'_, HashMap<Fingerprint, CacheEntry>>> {
        self.entries.lock().map_err(|_| {
            ExError::new(ExErrorKind::Internal)
                .with_op(op)
                .with_message("memory cache lock poisoned")
        })
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, fingerprint: &Fingerprint) -> BackendResult<Option<CacheEntry>> {
        Ok(self.lock("cache_read")?.get(fingerprint).cloned())
    }

    fn write(&self, entry: &CacheEntry) -> BackendResult<()> {
        self.lock("cache_write")?
            .insert(entry.fingerprint.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, fingerprint: &Fingerprint) -> BackendResult<bool> {
        Ok(self.lock("cache_remove")?.remove(fingerprint).is_some())
    }

    fn keys(&self) -> BackendResult<Vec<Fingerprint>> {
        let mut keys: Vec<Fingerprint> = self.lock("cache_keys")?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NarrativeConfig;
    use crate::model::ChangeSet;
    use chrono::{DateTime, Utc};

    #[test]
    fn test_write_read_remove() {
        let backend = MemoryBackend::new();
        let fp = Fingerprint::compute(&ChangeSet::new(), &NarrativeConfig::default()).unwrap();
        let entry = CacheEntry::new(fp.clone(), "text", DateTime::<Utc>::default());

        assert_eq!(backend.read(&fp).unwrap(), None);
        backend.write(&entry).unwrap();
        assert_eq!(backend.read(&fp).unwrap(), Some(entry));
        assert_eq!(backend.keys().unwrap(), vec![fp.clone()]);
        assert!(backend.remove(&fp).unwrap());
        assert!(!backend.remove(&fp).unwrap());
    }
}
