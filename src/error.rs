use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `stakewriter`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the orchestrator converts anything that
/// reaches the process boundary into a `{success: false, error}` response.
#[derive(Debug, Error)]
pub enum OutreachError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Completion provider ─────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Structured-output parsing ───────────────────────────────────────
    #[error("parse: {0}")]
    Parse(#[from] ParseError),

    // ── Report input ────────────────────────────────────────────────────
    #[error("report: {0}")]
    Report(#[from] ReportError),

    // ── Email writer ────────────────────────────────────────────────────
    #[error("writer: {0}")]
    Writer(#[from] WriterError),

    // ── Caller-initiated cancellation ───────────────────────────────────
    #[error("run cancelled")]
    Cancelled,

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("completion API key not set (OPENROUTER_API_KEY or config.toml)")]
    MissingApiKey,

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid mode config: {0}")]
    ModeConfig(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Completion provider errors ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider {provider} request failed: {message}")]
    Request {
        provider: String,
        message: String,
        retryable: bool,
    },

    #[error("provider {provider} rate-limited")]
    RateLimited { provider: String },

    #[error("provider {provider} authentication failed")]
    Auth { provider: String },

    #[error("provider {provider} returned no usable content")]
    EmptyResponse { provider: String },

    #[error("provider {provider} failed after {attempts} attempts: {last}")]
    Exhausted {
        provider: String,
        attempts: u32,
        last: String,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Transient failures are worth another attempt; auth and malformed
    /// requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Request { retryable, .. } => *retryable,
            Self::Auth { .. }
            | Self::EmptyResponse { .. }
            | Self::Exhausted { .. }
            | Self::Cancelled => false,
        }
    }
}

// ─── Structured-output parse errors ─────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("stakeholder extraction returned unparseable output: {0}")]
    Extraction(String),

    #[error("draft response was not a subject/body object: {0}")]
    Draft(String),

    #[error("evaluation response was not a rubric object: {0}")]
    Evaluation(String),
}

// ─── Report input errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report text is empty")]
    Empty,

    #[error("invalid file_url: {0}")]
    InvalidUrl(String),

    #[error("remote report not resolved: {0}")]
    Unresolved(String),
}

// ─── Email writer errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("draft generation failed for {stakeholder}: {source}")]
    Draft {
        stakeholder: String,
        #[source]
        source: Box<OutreachError>,
    },

    #[error("draft for {stakeholder} has an empty subject or body")]
    EmptyDraft { stakeholder: String },

    #[error("unknown style key: {0}")]
    UnknownStyle(String),

    #[error("task cancelled for {stakeholder}")]
    Cancelled { stakeholder: String },
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, OutreachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = OutreachError::Config(ConfigError::Validation("bad threshold".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn auth_error_is_not_retryable() {
        let err = ProviderError::Auth {
            provider: "openrouter".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_is_retryable() {
        let err = ProviderError::RateLimited {
            provider: "openrouter".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn request_error_carries_retryability() {
        let transient = ProviderError::Request {
            provider: "openrouter".into(),
            message: "503 Service Unavailable".into(),
            retryable: true,
        };
        let client = ProviderError::Request {
            provider: "openrouter".into(),
            message: "400 Bad Request".into(),
            retryable: false,
        };
        assert!(transient.is_retryable());
        assert!(!client.is_retryable());
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let err: OutreachError = anyhow_err.into();
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn writer_error_displays_stakeholder() {
        let err = WriterError::EmptyDraft {
            stakeholder: "Dr. Jane Smith".into(),
        };
        assert!(err.to_string().contains("Dr. Jane Smith"));
    }
}
