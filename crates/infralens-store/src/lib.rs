//! InfraLens Store - persistent narrative cache
//!
//! Provides:
//! - `FsBackend`: one JSON document per cache entry
//! - Sharding by the first two hex characters of the fingerprint
//! - Atomic temp→rename writes with unique temp names

pub mod errors;
pub mod fs;

pub use errors::Result;
pub use fs::FsBackend;
