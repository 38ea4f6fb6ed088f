//! Core types shared across InfraLens crates
//!
//! - **Correlation**: `RunId` tags every event of one analysis run
//! - **Sensitive data**: `Sensitive<T>` redacts credentials in logs and `Debug`
//! - **Schema constants**: canonical logging field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RunId;
pub use sensitive::Sensitive;
