use std::path::{Path, PathBuf};

pub const ENTRY_EXTENSION: &str = "json";

/// For fingerprint "abc123...", returns "<root>/ab/abc123....json"
pub fn entry_path(root: &Path, shard: &str, fingerprint: &str) -> PathBuf {
    root.join(shard)
        .join(format!("{}.{}", fingerprint, ENTRY_EXTENSION))
}
