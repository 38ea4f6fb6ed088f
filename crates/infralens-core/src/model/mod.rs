//! Canonical change model
//!
//! `ChangeSet` → `StackChange` → `ResourceChange` is a strict ownership
//! tree. Counters live on the `ChangeSet` and are recomputed on every
//! insertion; nothing outside this module can set them.

pub mod action;
pub mod change_set;

pub use action::Action;
pub use change_set::{ChangeSet, ChangeSummary, ResourceChange, StackChange};
