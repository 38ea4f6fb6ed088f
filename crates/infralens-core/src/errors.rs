use thiserror::Error;

/// Result type alias using InfraLensError
pub type Result<T> = std::result::Result<T, InfraLensError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable `ERR_*` code that callers (the CLI, CI
/// annotations, tests) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    MalformedInput,
    InvalidConfig,

    // Policy
    DestructiveChangeBlocked,

    // External service
    QuotaExceeded,
    SummarizationUnavailable,
    ExternalService,

    // Cache / persistence
    CacheCorrupt,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MalformedInput => "ERR_MALFORMED_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::DestructiveChangeBlocked => "ERR_DESTRUCTIVE_CHANGE_BLOCKED",
            ExErrorKind::QuotaExceeded => "ERR_QUOTA_EXCEEDED",
            ExErrorKind::SummarizationUnavailable => "ERR_SUMMARIZATION_UNAVAILABLE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::CacheCorrupt => "ERR_CACHE_CORRUPT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a run failing with this kind was caused by its input rather
    /// than by the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::MalformedInput | ExErrorKind::InvalidConfig
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context. Cache backends return
/// this directly; domain code converts from [`InfraLensError`].
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (a fingerprint, stack name or JSON path)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for analysis runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfraLensError {
    // ===== Input Errors =====
    /// Diff input is structurally invalid; never retried
    #[error("Malformed diff input at {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    /// Configuration value out of range
    #[error("Invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ===== Policy Errors =====
    /// Destructive changes present while fail-fast is enabled
    #[error("{destructive_count} destructive change(s) blocked by fail-on-destructive")]
    DestructiveChangeBlocked { destructive_count: usize },

    // ===== External Service Errors =====
    /// Narrative provider refused the request for billing/quota reasons
    #[error("Narrative quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Retry budget or deadline exhausted without a narrative
    #[error("Summarization unavailable after {attempts} attempt(s): {reason}")]
    SummarizationUnavailable { attempts: u32, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl InfraLensError {
    /// Shorthand used throughout the parser
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        InfraLensError::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        InfraLensError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<InfraLensError> for ExError {
    fn from(err: InfraLensError) -> Self {
        match err {
            InfraLensError::MalformedInput { path, reason } => {
                ExError::new(ExErrorKind::MalformedInput)
                    .with_op("parse_diff")
                    .with_entity_id(path)
                    .with_message(reason)
            }
            InfraLensError::InvalidConfig { field, reason } => {
                ExError::new(ExErrorKind::InvalidConfig)
                    .with_op("validate_config")
                    .with_entity_id(field)
                    .with_message(reason)
            }
            InfraLensError::DestructiveChangeBlocked { destructive_count } => {
                ExError::new(ExErrorKind::DestructiveChangeBlocked)
                    .with_op("analyze")
                    .with_message(format!(
                        "{} destructive change(s) present",
                        destructive_count
                    ))
            }
            InfraLensError::QuotaExceeded { message } => ExError::new(ExErrorKind::QuotaExceeded)
                .with_op("summarize")
                .with_message(message),
            InfraLensError::SummarizationUnavailable { attempts, reason } => {
                ExError::new(ExErrorKind::SummarizationUnavailable)
                    .with_op("summarize")
                    .with_message(format!("after {} attempt(s): {}", attempts, reason))
            }
            InfraLensError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for InfraLensError {
    fn from(err: serde_json::Error) -> Self {
        InfraLensError::Serialization {
            message: err.to_string(),
        }
    }
}
