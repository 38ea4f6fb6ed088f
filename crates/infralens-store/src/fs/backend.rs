use super::atomic::atomic_write;
use super::sharding::{entry_path, ENTRY_EXTENSION};
use crate::errors::{corrupt_entry, encode_failed, entry_io_error, io_error, Result};
use infralens_core::cache::{CacheBackend, CacheEntry};
use infralens_core::Fingerprint;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Cache backend persisting one JSON document per entry
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// The directory is created lazily on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        entry_path(&self.root, fingerprint.shard(), fingerprint.as_str())
    }
}

impl CacheBackend for FsBackend {
    fn read(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let path = self.path_for(fingerprint);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(entry_io_error("cache_read", fingerprint.as_str(), e)),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)
            .map_err(|e| corrupt_entry(fingerprint.as_str(), e))?;
        if entry.fingerprint != *fingerprint {
            return Err(corrupt_entry(
                fingerprint.as_str(),
                format!("document belongs to {}", entry.fingerprint),
            ));
        }
        Ok(Some(entry))
    }

    fn write(&self, entry: &CacheEntry) -> Result<()> {
        let key = entry.fingerprint.as_str();
        let bytes = serde_json::to_vec_pretty(entry).map_err(|e| encode_failed(key, e))?;
        atomic_write(&self.path_for(&entry.fingerprint), &bytes)
            .map_err(|e| e.with_entity_id(key))?;

        tracing::debug!(
            component = module_path!(),
            op = "cache_write",
            fingerprint = key,
            bytes = bytes.len() as u64,
            "cache entry persisted"
        );
        Ok(())
    }

    fn remove(&self, fingerprint: &Fingerprint) -> Result<bool> {
        match fs::remove_file(self.path_for(fingerprint)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(entry_io_error("cache_remove", fingerprint.as_str(), e)),
        }
    }

    /// Files that are not `<64 hex>.json` (temp files, strays) are ignored
    fn keys(&self) -> Result<Vec<Fingerprint>> {
        let shards = match fs::read_dir(&self.root) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("cache_list", e)),
        };

        let mut keys = Vec::new();
        for shard in shards {
            let shard = shard.map_err(|e| io_error("cache_list", e))?;
            if !shard.path().is_dir() {
                continue;
            }
            let files = fs::read_dir(shard.path()).map_err(|e| io_error("cache_list", e))?;
            for file in files {
                let path = file.map_err(|e| io_error("cache_list", e))?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                if let Some(fp) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Fingerprint::from_hex)
                {
                    keys.push(fp);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
