//! Filesystem cache backend
//!
//! Layout: `<root>/<first two hex chars>/<fingerprint>.json`

mod atomic;
mod backend;
mod sharding;

pub use backend::FsBackend;
