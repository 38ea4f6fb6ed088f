//! CLI settings: optional TOML file plus flag overrides

use crate::error::CliError;
use infralens_core::config::AnalysisConfig;
use infralens_core_types::Sensitive;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_DIR: &str = ".infra-lens-cache";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Contents of `infralens.toml`.
///
/// ```toml
/// cache_dir = ".infra-lens-cache"
/// fail_on_destructive = true
///
/// [narrative]
/// language = "nl"
/// model = "gpt-4o-mini"
///
/// [retry]
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub analysis: AnalysisConfig,
    pub cache_dir: PathBuf,
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// `Read` if the file cannot be read, `ConfigFile` if it is not valid TOML
    /// for these settings.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|message| CliError::ConfigFile {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// API key from the environment; `None` when unset or blank
pub fn api_key_from_env() -> Option<Sensitive<String>> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(Sensitive::new)
        .filter(|key| !key.is_blank())
}
