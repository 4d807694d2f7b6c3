use crate::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Runtime configuration ─────────────────────────────────────────

/// Crate-wide configuration, loaded from `config.toml` with environment
/// overrides. The API credential is resolved at startup; its absence is a
/// configuration error, never a per-call failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider API key. `OPENROUTER_API_KEY` wins over the file.
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub writer: WriterConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on simultaneous in-flight completion requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Minimum evaluation score that accepts a draft without refinement.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Maximum refinement rounds per draft.
    #[serde(default = "default_max_refine_rounds")]
    pub max_refine_rounds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Character window the report is truncated to before context extraction.
    #[serde(default = "default_report_window_chars")]
    pub report_window_chars: usize,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_in_flight() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_quality_threshold() -> f64 {
    7.0
}

fn default_max_refine_rounds() -> u32 {
    2
}

fn default_report_window_chars() -> usize {
    24_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            reliability: ReliabilityConfig::default(),
            writer: WriterConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_in_flight: default_max_in_flight(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            max_refine_rounds: default_max_refine_rounds(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            report_window_chars: default_report_window_chars(),
        }
    }
}

impl Config {
    /// Default config file location (`<config dir>/stakewriter/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stakewriter").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the default path (missing file means defaults), then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path when given, otherwise the default
    /// location. Environment overrides apply either way.
    pub fn load_at(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let mut config = Self::load_from(path)?;
                config.apply_env();
                Ok(config)
            }
            None => Self::load(),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY")
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("STAKEWRITER_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }
    }

    /// Startup validation. Fails the run before any work is dispatched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingApiKey);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature {} out of range 0.0..=2.0",
                self.temperature
            )));
        }
        if !(0.0..=10.0).contains(&self.writer.quality_threshold) {
            return Err(ConfigError::Validation(format!(
                "quality_threshold {} out of range 0.0..=10.0",
                self.writer.quality_threshold
            )));
        }
        if self.reliability.max_in_flight == 0 {
            return Err(ConfigError::Validation(
                "max_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
