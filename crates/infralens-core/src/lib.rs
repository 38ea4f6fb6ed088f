//! InfraLens analysis engine
//!
//! Turns an infrastructure diff into a deterministic, risk-ranked report
//! with an optional cached narrative:
//!
//! ```text
//! bytes ─ parse ─▶ ChangeSet ─ classify ─▶ score ─▶ RiskAssessment
//!                                              │
//!                           fingerprint ─▶ SummaryCache ─▶ RetryingSummarizer
//!                                              │
//!                                        AnalysisReport
//! ```
//!
//! Entry point: [`pipeline::Analyzer`].

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod logging_facility;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod risk;
pub mod summarize;

#[doc(hidden)]
pub use infralens_core_types as __types;

pub use cache::{CacheBackend, CacheEntry, CacheStats, MemoryBackend, SummaryCache};
pub use config::{AnalysisConfig, Language, OutputShape};
pub use errors::{ExError, ExErrorKind, InfraLensError, Result};
pub use fingerprint::Fingerprint;
pub use model::{Action, ChangeSet, ResourceChange, StackChange};
pub use pipeline::{AnalysisReport, Analyzer, Narrative};
pub use risk::{CostImpact, DeploymentSize, RiskAssessment, RiskLevel};
pub use summarize::{BackendError, NarrativeBackend};
