use crate::error::ConfigError;
use crate::prompts::custom::validate_custom_instructions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Stakeholders ───────────────────────────────────────────────────────────

/// Identity-free stakeholder value object. Any persistent id or selection
/// flag lives outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StakeholderRecord {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown title")
    }

    pub fn details_or_default(&self) -> &str {
        self.details.as_deref().unwrap_or("No details available")
    }
}

// ─── Generation mode ────────────────────────────────────────────────────────

/// How a draft prompt is built. Selected once per task at construction time;
/// the variant carries its own configuration so nothing re-dispatches on a
/// string key at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSpec {
    AiStyle { style_key: String },
    Template { prompt_template: String },
    Custom { instructions: String },
}

impl GenerationSpec {
    /// Build and validate the spec from the wire-level `generation_mode`
    /// string plus its mode config object. Invalid combinations fail here,
    /// before any task is dispatched.
    pub fn from_request(mode: &str, mode_config: &Value) -> Result<Self, ConfigError> {
        match mode {
            "ai_style" => {
                let style_key = mode_config
                    .get("style_key")
                    .and_then(Value::as_str)
                    .unwrap_or("technical_direct")
                    .to_string();
                if crate::prompts::styles::get_style(&style_key).is_none() {
                    return Err(ConfigError::ModeConfig(format!(
                        "unknown style_key: {style_key}"
                    )));
                }
                Ok(Self::AiStyle { style_key })
            }
            "template" => {
                let template = mode_config
                    .get("promptTemplate")
                    .or_else(|| mode_config.get("prompt_template"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ConfigError::ModeConfig("template mode requires promptTemplate".into())
                    })?;
                if template.trim().is_empty() {
                    return Err(ConfigError::ModeConfig("promptTemplate is empty".into()));
                }
                Ok(Self::Template {
                    prompt_template: template.to_string(),
                })
            }
            "custom" => {
                let instructions = mode_config
                    .get("custom_instructions")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ConfigError::ModeConfig("custom mode requires custom_instructions".into())
                    })?;
                validate_custom_instructions(instructions)
                    .map_err(|reason| ConfigError::ModeConfig(reason.to_string()))?;
                Ok(Self::Custom {
                    instructions: instructions.to_string(),
                })
            }
            other => Err(ConfigError::ModeConfig(format!(
                "unknown generation_mode: {other}"
            ))),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::AiStyle { .. } => "ai_style",
            Self::Template { .. } => "template",
            Self::Custom { .. } => "custom",
        }
    }
}

// ─── Tasks ──────────────────────────────────────────────────────────────────

/// One unit of work: everything a single writer invocation needs. Context
/// strings are owned per task, never shared across siblings.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub stakeholder: StakeholderRecord,
    pub company_name: String,
    pub company_summary: String,
    pub relevant_context: String,
    pub spec: GenerationSpec,
}

// ─── Drafts & results ───────────────────────────────────────────────────────

/// Working subject/body pair, mutated across refinement rounds within one
/// writer invocation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

/// Frozen outcome of one writer invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailResult {
    pub stakeholder_name: String,
    pub stakeholder_title: String,
    pub email_subject: String,
    pub email_body: String,
    /// 0–10 rubric score; `None` when evaluation was skipped or failed.
    pub quality_score: Option<f64>,
    pub reflection_notes: String,
    pub rounds_used: u32,
    pub generation_mode: String,
}

/// One stakeholder's pipeline failed; siblings are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    pub stakeholder_name: String,
    pub error: String,
}
