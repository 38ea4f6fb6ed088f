//! Atomic write primitives
//!
//! Temp file + rename in the same directory, so readers see either the
//! old document or the new one. Temp names are unique per write, so
//! concurrent writers to one key never share a temp file; the last
//! rename wins.

use crate::errors::{io_error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const TEMP_SUFFIX: &str = "tmp";

fn temp_path_for(target_path: &Path) -> PathBuf {
    let file_name = target_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target_path.with_file_name(format!(".{}.{}.{}", file_name, Uuid::new_v4(), TEMP_SUFFIX))
}

/// Atomically write bytes to a file, creating parent directories
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_cache_dir", e))?;
    }

    let temp_path = temp_path_for(target_path);
    fs::write(&temp_path, content).map_err(|e| io_error("write_cache_temp", e))?;

    if let Err(e) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("rename_cache_temp", e));
    }

    Ok(())
}
