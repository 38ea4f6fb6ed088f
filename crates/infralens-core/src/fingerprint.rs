//! Cache fingerprints
//!
//! A fingerprint is the SHA-256 of the canonical JSON of the `ChangeSet`
//! together with every setting that changes the narrative. Two runs with
//! the same fingerprint may share a cached narrative.
//!
//! ## Determinism Guarantees
//!
//! - Same change set and settings → same fingerprint
//! - Different stack or resource order → different fingerprint
//! - Bumping [`FINGERPRINT_VERSION`] orphans every existing cache entry

use crate::config::{Language, NarrativeConfig};
use crate::errors::Result;
use crate::model::ChangeSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Bump whenever the prompt text or the hashed layout changes.
pub const FINGERPRINT_VERSION: &str = "infralens-narrative-v1";

const HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 content key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

#[derive(Serialize)]
struct FingerprintInput<'a> {
    version: &'static str,
    change_set: &'a ChangeSet,
    language: Language,
    model: &'a str,
    max_length: u32,
    temperature: f32,
}

impl Fingerprint {
    /// Compute the fingerprint of a change set under `narrative` settings.
    ///
    /// # Errors
    ///
    /// `Serialization` if the change set cannot be encoded.
    pub fn compute(change_set: &ChangeSet, narrative: &NarrativeConfig) -> Result<Self> {
        let input = FingerprintInput {
            version: FINGERPRINT_VERSION,
            change_set,
            language: narrative.language,
            model: &narrative.model,
            max_length: narrative.max_length,
            temperature: narrative.temperature,
        };
        let canonical = serde_json::to_string(&input)?;
        Ok(Self(hash_string(&canonical)))
    }

    /// Accept a previously rendered fingerprint (64 lower-case hex chars).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == HEX_LEN
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two hex characters, used to shard on-disk entries
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
