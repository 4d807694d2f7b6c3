use crate::agents::extractor::StakeholderExtractor;
use crate::agents::planner::{PlannerRequest, TaskPlanner};
use crate::agents::writer::WriterSettings;
use crate::config::Config;
use crate::error::{ConfigError, OutreachError, Result};
use crate::events::{collect_events, log_channel, LiveSink, LogEvent, Logger};
use crate::llm::{CompletionClient, CompletionParams, OpenRouterClient, ReliableClient};
use crate::model::{EmailResult, GenerationSpec, StakeholderRecord, TaskFailure};
use crate::report::{InlineOnlyResolver, ReportInput, ReportResolver};
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ─── Entry contract ─────────────────────────────────────────────────────────

/// One request at the process boundary, discriminated by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    ExtractStakeholders {
        #[serde(default, rename = "workflowId")]
        workflow_id: Option<String>,
        #[serde(rename = "reportInput")]
        report_input: ReportInput,
    },
    GenerateEmails {
        #[serde(default, rename = "workflowId")]
        workflow_id: Option<String>,
        #[serde(rename = "reportInput")]
        report_input: ReportInput,
        #[serde(rename = "selectedStakeholders")]
        selected_stakeholders: Vec<StakeholderRecord>,
        #[serde(default, rename = "companyName")]
        company_name: Option<String>,
        #[serde(default, rename = "companySummary")]
        company_summary: String,
        #[serde(rename = "generationMode")]
        generation_mode: String,
        #[serde(default, rename = "modeConfig")]
        mode_config: Value,
    },
}

impl Request {
    pub fn workflow_id(&self) -> Option<&str> {
        match self {
            Self::ExtractStakeholders { workflow_id, .. }
            | Self::GenerateEmails { workflow_id, .. } => workflow_id.as_deref(),
        }
    }
}

/// One response at the process boundary. Always well-formed: every run ends
/// in exactly one of these, with the full ordered log trace attached.
#[derive(Debug, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stakeholders: Option<Vec<StakeholderRecord>>,
    #[serde(rename = "companySummary", skip_serializing_if = "Option::is_none")]
    pub company_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<EmailResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<TaskFailure>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<LogEvent>,
}

impl Response {
    pub(crate) fn failure(error: String, logs: Vec<LogEvent>) -> Self {
        Self {
            success: false,
            stakeholders: None,
            company_summary: None,
            emails: None,
            failed: None,
            error: Some(error),
            logs,
        }
    }
}

enum Payload {
    Extraction {
        stakeholders: Vec<StakeholderRecord>,
        company_summary: String,
    },
    Emails {
        emails: Vec<EmailResult>,
        failed: Vec<TaskFailure>,
    },
}

// ─── Orchestrator ───────────────────────────────────────────────────────────

/// Top-level entry point: one request in, one total response out.
///
/// Every failure below this layer (provider, parse, report, cancellation)
/// is converted into `{success: false, error}`; a raw fault never crosses
/// the boundary. Partial generation success is still `success: true` with
/// the failures enumerated per stakeholder.
pub struct Orchestrator {
    config: Config,
    client: Arc<dyn CompletionClient>,
    resolver: Arc<dyn ReportResolver>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        client: Arc<dyn CompletionClient>,
        resolver: Arc<dyn ReportResolver>,
    ) -> Self {
        Self {
            config,
            client,
            resolver,
        }
    }

    /// Build against the live OpenRouter provider. The credential is checked
    /// here, at startup, never per call.
    pub fn from_config(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let api_key = config.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        let client = OpenRouterClient::new(
            api_key,
            &config.base_url,
            &config.model,
            Duration::from_secs(config.reliability.request_timeout_secs),
        );
        Ok(Self::new(
            config,
            Arc::new(client),
            Arc::new(InlineOnlyResolver),
        ))
    }

    pub async fn handle(
        &self,
        request: Request,
        cancel: CancellationToken,
        live_sink: Option<LiveSink>,
    ) -> Response {
        let (tx, rx) = log_channel();
        let collector = collect_events(rx, live_sink);

        let workflow_id = request
            .workflow_id()
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        let logger = Logger::new(tx, "Orchestrator").with_correlation_id(workflow_id);

        let outcome = self.dispatch(request, &logger, cancel).await;
        if let Err(e) = &outcome {
            logger.error(format!("Run failed: {e}"));
        }

        // Dropping the last sender lets the collector resolve with the full
        // ordered trace.
        drop(logger);
        let logs = collector.await.unwrap_or_default();

        match outcome {
            Ok(Payload::Extraction {
                stakeholders,
                company_summary,
            }) => Response {
                success: true,
                stakeholders: Some(stakeholders),
                company_summary: Some(company_summary),
                emails: None,
                failed: None,
                error: None,
                logs,
            },
            Ok(Payload::Emails { emails, failed }) => Response {
                success: true,
                stakeholders: None,
                company_summary: None,
                emails: Some(emails),
                failed: Some(failed),
                error: None,
                logs,
            },
            Err(e) => Response::failure(e.to_string(), logs),
        }
    }

    async fn dispatch(
        &self,
        request: Request,
        logger: &Logger,
        cancel: CancellationToken,
    ) -> Result<Payload> {
        let client: Arc<dyn CompletionClient> = Arc::new(ReliableClient::new(
            Arc::clone(&self.client),
            &self.config.reliability,
            cancel.clone(),
        ));
        let params = CompletionParams {
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match request {
            Request::ExtractStakeholders { report_input, .. } => {
                let report = self.resolver.resolve(&report_input).await?;
                logger.info("Starting stakeholder extraction");

                let extractor = StakeholderExtractor::new(
                    client,
                    params,
                    logger.for_agent("StakeholderExtractor"),
                );
                let result = extractor.extract(&report).await?;
                Ok(Payload::Extraction {
                    stakeholders: result.stakeholders,
                    company_summary: result.company_summary,
                })
            }
            Request::GenerateEmails {
                report_input,
                selected_stakeholders,
                company_name,
                company_summary,
                generation_mode,
                mode_config,
                ..
            } => {
                // Mode config is validated before any report or provider
                // work is dispatched.
                let spec = GenerationSpec::from_request(&generation_mode, &mode_config)
                    .map_err(OutreachError::Config)?;
                let report = self.resolver.resolve(&report_input).await?;
                logger.info(format!(
                    "Starting email generation for {} stakeholder(s)",
                    selected_stakeholders.len()
                ));

                let planner = TaskPlanner::new(
                    client,
                    params,
                    WriterSettings {
                        quality_threshold: self.config.writer.quality_threshold,
                        max_refine_rounds: self.config.writer.max_refine_rounds,
                    },
                    self.config.retrieval.report_window_chars,
                    logger.for_agent("TaskPlanner"),
                    cancel,
                );
                let outcome = planner
                    .run(&PlannerRequest {
                        stakeholders: selected_stakeholders,
                        company_name: company_name
                            .unwrap_or_else(|| "the company".to_string()),
                        company_summary,
                        report_text: report,
                        spec,
                    })
                    .await;
                Ok(Payload::Emails {
                    emails: outcome.emails,
                    failed: outcome.failures,
                })
            }
        }
    }
}
