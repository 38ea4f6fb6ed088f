//! Analysis configuration
//!
//! `AnalysisConfig` is an explicit value handed to the [`Analyzer`]; the
//! core never reads the environment or the command line. Every field has a
//! default so a partial TOML/JSON document deserializes cleanly.
//!
//! [`Analyzer`]: crate::pipeline::Analyzer

use crate::errors::{InfraLensError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Narrative output language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
    De,
    Fr,
    Es,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Nl,
        Language::De,
        Language::Fr,
        Language::Es,
    ];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Es => "es",
        }
    }

    /// English name, as used in the narrative request
    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Nl => "Dutch",
            Language::De => "German",
            Language::Fr => "French",
            Language::Es => "Spanish",
        }
    }
}

impl FromStr for Language {
    type Err = InfraLensError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == lowered)
            .ok_or_else(|| {
                InfraLensError::invalid_config(
                    "narrative.language",
                    format!("unsupported language '{}'", s),
                )
            })
    }
}

/// Shape requested from the rendering collaborator.
///
/// The core only carries this through to the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    Comment,
    Issue,
    #[default]
    Both,
    Markdown,
    Json,
    Html,
}

impl OutputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputShape::Comment => "comment",
            OutputShape::Issue => "issue",
            OutputShape::Both => "both",
            OutputShape::Markdown => "markdown",
            OutputShape::Json => "json",
            OutputShape::Html => "html",
        }
    }
}

impl FromStr for OutputShape {
    type Err = InfraLensError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comment" => Ok(OutputShape::Comment),
            "issue" => Ok(OutputShape::Issue),
            "both" => Ok(OutputShape::Both),
            "markdown" => Ok(OutputShape::Markdown),
            "json" => Ok(OutputShape::Json),
            "html" => Ok(OutputShape::Html),
            _ => Err(InfraLensError::invalid_config(
                "output",
                format!("unsupported output shape '{}'", s),
            )),
        }
    }
}

/// Settings that shape the narrative request. All of them except
/// `enabled` and `request_timeout_secs` feed the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub enabled: bool,
    pub language: Language,
    pub model: String,
    /// Upper bound on generated tokens
    pub max_length: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: Language::En,
            model: "gpt-4".to_string(),
            max_length: 500,
            temperature: 0.7,
            request_timeout_secs: 30,
        }
    }
}

impl NarrativeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24,
            max_size_mb: 100,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Bounded retry around the narrative call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total calls, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
    /// Overall budget for the retry loop; `None` means unbounded
    pub deadline_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            jitter: true,
            deadline_ms: None,
        }
    }
}

impl RetryPolicy {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

/// Everything a single analysis run needs to know
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub narrative: NarrativeConfig,
    pub output: OutputShape,
    pub cache: CacheConfig,
    pub retry: RetryPolicy,
    /// Fail the run before any narrative call when deletes or replaces exist
    pub fail_on_destructive: bool,
}

impl AnalysisConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.narrative.max_length == 0 {
            return Err(InfraLensError::invalid_config(
                "narrative.max_length",
                "must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(InfraLensError::invalid_config(
                "narrative.temperature",
                format!("{} is outside 0.0..=2.0", self.narrative.temperature),
            ));
        }
        if self.narrative.model.trim().is_empty() {
            return Err(InfraLensError::invalid_config(
                "narrative.model",
                "must not be empty",
            ));
        }
        if self.cache.ttl_hours == 0 {
            return Err(InfraLensError::invalid_config(
                "cache.ttl_hours",
                "must be greater than 0",
            ));
        }
        if self.cache.max_size_mb == 0 {
            return Err(InfraLensError::invalid_config(
                "cache.max_size_mb",
                "must be greater than 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(InfraLensError::invalid_config(
                "retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(InfraLensError::invalid_config(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        Ok(())
    }
}
