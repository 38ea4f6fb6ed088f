//! Narrative generation
//!
//! [`NarrativeBackend`] is the external capability (an LLM endpoint);
//! [`RetryingSummarizer`] wraps it in a bounded retry loop that writes
//! successful narratives through to the cache.

pub mod backend;
pub mod retry;

pub use backend::{BackendError, NarrativeBackend};
pub use retry::{backoff_delay, RetryingSummarizer};
