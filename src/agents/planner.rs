use crate::agents::context::ContextRetriever;
use crate::agents::writer::{EmailWriterAgent, WriterSettings};
use crate::events::Logger;
use crate::llm::{CompletionClient, CompletionParams};
use crate::model::{EmailResult, GenerationSpec, GenerationTask, StakeholderRecord, TaskFailure};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the planner needs to fan one report out into per-stakeholder
/// email tasks.
#[derive(Debug, Clone)]
pub struct PlannerRequest {
    pub stakeholders: Vec<StakeholderRecord>,
    pub company_name: String,
    pub company_summary: String,
    pub report_text: String,
    pub spec: GenerationSpec,
}

/// Fan-in result. `emails` and `failures` are disjoint and together cover
/// every requested stakeholder, each in input order.
#[derive(Debug)]
pub struct PlanOutcome {
    pub emails: Vec<EmailResult>,
    pub failures: Vec<TaskFailure>,
}

/// Layer-2 coordination agent: fans a stakeholder list out into independent
/// context-then-write pipelines and merges the results.
///
/// One stakeholder's failure never aborts its siblings; the provider-level
/// in-flight cap is the only throttle, so all tasks are dispatched at once.
pub struct TaskPlanner {
    client: Arc<dyn CompletionClient>,
    params: CompletionParams,
    settings: WriterSettings,
    window_chars: usize,
    logger: Logger,
    cancel: CancellationToken,
}

impl TaskPlanner {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        params: CompletionParams,
        settings: WriterSettings,
        window_chars: usize,
        logger: Logger,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            params,
            settings,
            window_chars,
            logger,
            cancel,
        }
    }

    pub async fn run(&self, request: &PlannerRequest) -> PlanOutcome {
        let total = request.stakeholders.len();
        self.logger.info(format!(
            "Planning {total} email task(s) (mode: {})",
            request.spec.mode_name()
        ));

        // Phase 1: retrieve role-specific context for every stakeholder.
        let retrievals = request
            .stakeholders
            .iter()
            .enumerate()
            .map(|(index, stakeholder)| {
                let retriever = ContextRetriever::new(
                    Arc::clone(&self.client),
                    self.params,
                    self.window_chars,
                    self.logger.for_agent("ContextRetriever"),
                );
                let report = request.report_text.as_str();
                async move { (index, retriever.retrieve(stakeholder, report).await) }
            });

        let mut failures_by_index: BTreeMap<usize, TaskFailure> = BTreeMap::new();
        let mut tasks: Vec<(usize, GenerationTask)> = Vec::with_capacity(total);
        for (index, outcome) in join_all(retrievals).await {
            let stakeholder = &request.stakeholders[index];
            match outcome {
                Ok(relevant_context) => tasks.push((
                    index,
                    GenerationTask {
                        stakeholder: stakeholder.clone(),
                        company_name: request.company_name.clone(),
                        company_summary: request.company_summary.clone(),
                        relevant_context,
                        spec: request.spec.clone(),
                    },
                )),
                Err(e) => {
                    self.logger.warn(format!(
                        "Context retrieval failed for {}: {e}",
                        stakeholder.name
                    ));
                    failures_by_index.insert(
                        index,
                        TaskFailure {
                            stakeholder_name: stakeholder.name.clone(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        // Phase 2: write emails for every stakeholder whose context resolved.
        let runs = tasks.iter().map(|(index, task)| {
            let writer = EmailWriterAgent::new(
                Arc::clone(&self.client),
                self.params,
                self.settings,
                self.logger.for_agent(format!("EmailWriter-{}", index + 1)),
                self.cancel.clone(),
            );
            async move { (*index, writer.run(task).await) }
        });

        let mut emails_by_index: BTreeMap<usize, EmailResult> = BTreeMap::new();
        for (index, outcome) in join_all(runs).await {
            match outcome {
                Ok(email) => {
                    emails_by_index.insert(index, email);
                }
                Err(e) => {
                    self.logger.warn(format!(
                        "Email task failed for {}: {e}",
                        request.stakeholders[index].name
                    ));
                    failures_by_index.insert(
                        index,
                        TaskFailure {
                            stakeholder_name: request.stakeholders[index].name.clone(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        self.logger.info(format!(
            "Generated {} email(s), {} task(s) failed",
            emails_by_index.len(),
            failures_by_index.len()
        ));

        PlanOutcome {
            emails: emails_by_index.into_values().collect(),
            failures: failures_by_index.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::events::log_channel;
    use crate::llm::ChatMessage;
    use crate::prompts::{context, writer};
    use std::future::Future;
    use std::pin::Pin;

    const DRAFT: &str = r#"{"subject": "Subject", "body": "Body text."}"#;
    const GOOD_EVAL: &str = r#"{"overall_score": 9.0, "weaknesses": [], "improvement_suggestions": ""}"#;

    /// Routes each call by pipeline stage (system prompt) and stakeholder
    /// (user prompt), so concurrent tasks get deterministic responses.
    struct RoutedClient {
        fail_context_for: Option<&'static str>,
        fail_draft_for: Option<&'static str>,
    }

    impl RoutedClient {
        fn happy() -> Self {
            Self {
                fail_context_for: None,
                fail_draft_for: None,
            }
        }
    }

    impl CompletionClient for RoutedClient {
        fn name(&self) -> &str {
            "routed"
        }

        fn complete<'a>(
            &'a self,
            messages: &'a [ChatMessage],
            _params: CompletionParams,
        ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
            let system = messages[0].content.clone();
            let user = messages[1].content.clone();
            let fail_context = self.fail_context_for;
            let fail_draft = self.fail_draft_for;
            Box::pin(async move {
                let unavailable = || ProviderError::Request {
                    provider: "routed".into(),
                    message: "503 Service Unavailable".into(),
                    retryable: true,
                };
                if system == context::CONTEXT_SYSTEM_PROMPT {
                    if fail_context.is_some_and(|name| user.contains(name)) {
                        return Err(unavailable());
                    }
                    return Ok("relevant context".to_string());
                }
                if system == writer::GENERATION_SYSTEM_PROMPT {
                    if fail_draft.is_some_and(|name| user.contains(name)) {
                        return Ok("not json at all".to_string());
                    }
                    return Ok(DRAFT.to_string());
                }
                if system == writer::EVALUATION_SYSTEM_PROMPT {
                    return Ok(GOOD_EVAL.to_string());
                }
                Ok(DRAFT.to_string())
            })
        }
    }

    fn planner(client: RoutedClient) -> TaskPlanner {
        let (tx, _rx) = log_channel();
        TaskPlanner::new(
            Arc::new(client) as Arc<dyn CompletionClient>,
            CompletionParams {
                max_tokens: 1024,
                temperature: 0.7,
            },
            WriterSettings {
                quality_threshold: 7.0,
                max_refine_rounds: 2,
            },
            24_000,
            Logger::new(tx, "Planner"),
            CancellationToken::new(),
        )
    }

    fn request(names: &[&str]) -> PlannerRequest {
        PlannerRequest {
            stakeholders: names
                .iter()
                .map(|name| StakeholderRecord {
                    name: (*name).to_string(),
                    title: Some("VP".into()),
                    details: None,
                })
                .collect(),
            company_name: "Mercy General".into(),
            company_summary: "Regional hospital network".into(),
            report_text: "Quality scores slipped 4% last quarter.".into(),
            spec: GenerationSpec::AiStyle {
                style_key: "technical_direct".into(),
            },
        }
    }

    #[tokio::test]
    async fn results_preserve_stakeholder_input_order() {
        let outcome = planner(RoutedClient::happy())
            .run(&request(&["Alice Ngo", "Bob Jones", "Carol Diaz"]))
            .await;

        let names: Vec<&str> = outcome
            .emails
            .iter()
            .map(|e| e.stakeholder_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice Ngo", "Bob Jones", "Carol Diaz"]);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn one_failed_task_does_not_abort_siblings() {
        let client = RoutedClient {
            fail_context_for: None,
            fail_draft_for: Some("Bob Jones"),
        };
        let outcome = planner(client)
            .run(&request(&["Alice Ngo", "Bob Jones", "Carol Diaz"]))
            .await;

        let names: Vec<&str> = outcome
            .emails
            .iter()
            .map(|e| e.stakeholder_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice Ngo", "Carol Diaz"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stakeholder_name, "Bob Jones");
        assert!(!outcome.failures[0].error.is_empty());
    }

    #[tokio::test]
    async fn context_failure_is_isolated_to_its_stakeholder() {
        let client = RoutedClient {
            fail_context_for: Some("Alice Ngo"),
            fail_draft_for: None,
        };
        let outcome = planner(client)
            .run(&request(&["Alice Ngo", "Bob Jones"]))
            .await;

        assert_eq!(outcome.emails.len(), 1);
        assert_eq!(outcome.emails[0].stakeholder_name, "Bob Jones");
        assert_eq!(outcome.failures[0].stakeholder_name, "Alice Ngo");
    }

    #[tokio::test]
    async fn empty_stakeholder_list_yields_empty_outcome() {
        let outcome = planner(RoutedClient::happy()).run(&request(&[])).await;
        assert!(outcome.emails.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
