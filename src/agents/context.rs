use crate::error::Result;
use crate::events::Logger;
use crate::llm::{ChatMessage, CompletionClient, CompletionParams};
use crate::model::StakeholderRecord;
use crate::prompts::context as context_prompts;
use crate::report::truncate_report;
use std::sync::Arc;

/// Extracts the report passages relevant to one stakeholder's role.
///
/// The report is truncated to a deterministic head-biased window before
/// prompting so an oversized source degrades instead of failing. An empty
/// result is valid: it means the model found nothing role-specific.
pub struct ContextRetriever {
    client: Arc<dyn CompletionClient>,
    params: CompletionParams,
    window_chars: usize,
    logger: Logger,
}

impl ContextRetriever {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        params: CompletionParams,
        window_chars: usize,
        logger: Logger,
    ) -> Self {
        Self {
            client,
            params,
            window_chars,
            logger,
        }
    }

    pub async fn retrieve(&self, stakeholder: &StakeholderRecord, report: &str) -> Result<String> {
        self.logger.debug(format!(
            "Extracting relevant context for {}",
            stakeholder.name
        ));

        let window = truncate_report(report, self.window_chars);
        let messages = [
            ChatMessage::system(context_prompts::CONTEXT_SYSTEM_PROMPT),
            ChatMessage::user(context_prompts::context_extraction(stakeholder, &window)),
        ];

        let raw = self.client.complete(&messages, self.params).await?;
        let context = raw.trim().to_string();

        if context.is_empty() {
            self.logger.debug(format!(
                "No role-specific context found for {}",
                stakeholder.name
            ));
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::log_channel;
    use crate::llm::testing::ScriptedClient;

    fn retriever(client: Arc<ScriptedClient>, window: usize) -> ContextRetriever {
        let (tx, _rx) = log_channel();
        ContextRetriever::new(
            client as Arc<dyn CompletionClient>,
            CompletionParams {
                max_tokens: 1024,
                temperature: 0.7,
            },
            window,
            Logger::new(tx, "ContextRetriever"),
        )
    }

    fn stakeholder() -> StakeholderRecord {
        StakeholderRecord {
            name: "Dr. Jane Smith".into(),
            title: Some("CMO".into()),
            details: Some("Oversees quality.".into()),
        }
    }

    #[tokio::test]
    async fn returns_trimmed_free_text() {
        let client = Arc::new(ScriptedClient::ok(vec![
            "  Quality scores slipped 4% last quarter.  \n",
        ]));
        let retriever = retriever(Arc::clone(&client), 10_000);

        let context = retriever
            .retrieve(&stakeholder(), "full report text")
            .await
            .unwrap();
        assert_eq!(context, "Quality scores slipped 4% last quarter.");
        // Prompt carried the stakeholder and the report window.
        let prompt = client.prompt(0);
        assert!(prompt.contains("Dr. Jane Smith"));
        assert!(prompt.contains("full report text"));
    }

    #[tokio::test]
    async fn whitespace_only_result_is_a_valid_empty_context() {
        let client = Arc::new(ScriptedClient::ok(vec!["   \n  "]));
        let retriever = retriever(client, 10_000);

        let context = retriever.retrieve(&stakeholder(), "report").await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn oversized_report_is_windowed_not_rejected() {
        let client = Arc::new(ScriptedClient::ok(vec!["context"]));
        let retriever = retriever(Arc::clone(&client), 200);

        let long_report = "finding line\n".repeat(500);
        retriever
            .retrieve(&stakeholder(), &long_report)
            .await
            .unwrap();

        let prompt = client.prompt(0);
        assert!(prompt.contains("[report truncated]"));
        assert!(prompt.len() < long_report.len());
    }
}
