use crate::error::{OutreachError, ParseError, Result};
use crate::events::Logger;
use crate::llm::repair;
use crate::llm::{ChatMessage, CompletionClient, CompletionParams};
use crate::model::StakeholderRecord;
use crate::prompts::extraction;
use std::sync::Arc;

/// Stakeholder list plus company summary extracted from one report.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub stakeholders: Vec<StakeholderRecord>,
    pub company_summary: String,
}

/// Layer-2 agent: raw report text in, structured stakeholder records out.
///
/// Two completion calls: one for the stakeholder array, one for the company
/// summary. Malformed structured output gets the one-shot repair pass and
/// then surfaces as a typed parse error; an empty extraction is only ever
/// the model's explicit `[]`, never a parser shrug.
pub struct StakeholderExtractor {
    client: Arc<dyn CompletionClient>,
    params: CompletionParams,
    logger: Logger,
}

impl StakeholderExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, params: CompletionParams, logger: Logger) -> Self {
        Self {
            client,
            params,
            logger,
        }
    }

    pub async fn extract(&self, report: &str) -> Result<ExtractionResult> {
        self.logger.info(format!(
            "Analyzing report ({} characters) for stakeholders...",
            report.len()
        ));

        let stakeholders = self.extract_stakeholders(report).await?;
        self.logger
            .info(format!("Identified {} stakeholders", stakeholders.len()));

        let company_summary = self.summarize_company(report).await?;
        self.logger.info("Company summary extracted");

        Ok(ExtractionResult {
            stakeholders,
            company_summary,
        })
    }

    async fn extract_stakeholders(&self, report: &str) -> Result<Vec<StakeholderRecord>> {
        let messages = [
            ChatMessage::system(extraction::EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(extraction::stakeholder_extraction(report)),
        ];
        let raw = self.client.complete(&messages, self.params).await?;

        let stakeholders: Vec<StakeholderRecord> = repair::parse_array(&raw).map_err(|e| {
            self.logger
                .error(format!("Stakeholder extraction unparseable: {e}"));
            OutreachError::Parse(ParseError::Extraction(e))
        })?;

        // A record without a name is model noise, not data.
        if stakeholders.iter().any(|s| s.name.trim().is_empty()) {
            return Err(OutreachError::Parse(ParseError::Extraction(
                "stakeholder entry with empty name".into(),
            )));
        }

        Ok(stakeholders)
    }

    async fn summarize_company(&self, report: &str) -> Result<String> {
        let messages = [
            ChatMessage::system(extraction::EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(extraction::company_summary(report)),
        ];
        let raw = self.client.complete(&messages, self.params).await?;
        Ok(raw.trim().to_string())
    }
}
