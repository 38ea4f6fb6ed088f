use infralens_core::errors::{ExError, ExErrorKind, InfraLensError};
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for input and configuration errors
pub const EXIT_INPUT: i32 = 2;
/// Exit code when the destructive-change gate trips
pub const EXIT_BLOCKED: i32 = 3;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error(transparent)]
    Analysis(#[from] InfraLensError),

    #[error("HTTP client setup failed: {0}")]
    Http(String),

    #[error("Cannot encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigFile { .. } => EXIT_INPUT,
            CliError::Analysis(err) => {
                let ex: ExError = err.clone().into();
                match ex.kind() {
                    kind if kind.is_input_error() => EXIT_INPUT,
                    ExErrorKind::DestructiveChangeBlocked => EXIT_BLOCKED,
                    _ => EXIT_FAILURE,
                }
            }
            _ => EXIT_FAILURE,
        }
    }

    /// Stable `ERR_*` code for machine consumers
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Read { .. } | CliError::Write { .. } => ExErrorKind::Io.code(),
            CliError::ConfigFile { .. } => ExErrorKind::InvalidConfig.code(),
            CliError::Analysis(err) => ExError::from(err.clone()).code(),
            CliError::Http(_) => ExErrorKind::ExternalService.code(),
            CliError::Encode(_) => ExErrorKind::Serialization.code(),
        }
    }
}
