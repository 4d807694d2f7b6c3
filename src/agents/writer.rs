use crate::error::{OutreachError, ParseError, Result, WriterError};
use crate::events::Logger;
use crate::llm::repair;
use crate::llm::{ChatMessage, CompletionClient, CompletionParams};
use crate::model::{EmailDraft, EmailResult, GenerationSpec, GenerationTask};
use crate::prompts::styles::get_style;
use crate::prompts::vars::{self, TaskVars};
use crate::prompts::{custom, writer as writer_prompts};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Accept/refine knobs; product defaults live in [`crate::config::WriterConfig`].
#[derive(Debug, Clone, Copy)]
pub struct WriterSettings {
    pub quality_threshold: f64,
    pub max_refine_rounds: u32,
}

/// Rubric self-assessment returned by the evaluation call. Higher is better;
/// only `overall_score` gates the loop, the rest feeds the refinement prompt.
#[derive(Debug, Deserialize)]
struct EvaluationReport {
    overall_score: f64,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    improvement_suggestions: String,
}

/// Layer-3 execution agent: one invocation turns one [`GenerationTask`] into
/// one accepted [`EmailResult`] or one [`WriterError`].
///
/// State machine: Drafting → Evaluating → (Accepted | Refining → Evaluating…)
/// → Done. Refinement stops at the quality threshold or the round budget,
/// whichever comes first; a failed refinement falls back to the best draft
/// seen instead of discarding prior work.
pub struct EmailWriterAgent {
    client: Arc<dyn CompletionClient>,
    params: CompletionParams,
    settings: WriterSettings,
    logger: Logger,
    cancel: CancellationToken,
}

impl EmailWriterAgent {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        params: CompletionParams,
        settings: WriterSettings,
        logger: Logger,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            params,
            settings,
            logger,
            cancel,
        }
    }

    pub async fn run(&self, task: &GenerationTask) -> std::result::Result<EmailResult, WriterError> {
        let stakeholder = task.stakeholder.name.clone();
        self.check_cancelled(&stakeholder)?;

        self.logger.info(format!(
            "Drafting email for {stakeholder} (mode: {})",
            task.spec.mode_name()
        ));

        let task_vars = TaskVars::from_task(task);
        let prompt = self.generation_prompt(task, &task_vars)?;
        let mut draft = self
            .request_draft(
                writer_prompts::GENERATION_SYSTEM_PROMPT,
                &prompt,
                &task_vars,
            )
            .await
            .map_err(|e| WriterError::Draft {
                stakeholder: stakeholder.clone(),
                source: Box::new(e),
            })?;
        Self::require_substance(&draft, &stakeholder)?;

        let style_description = Self::style_description(&task.spec);
        let mut rounds_used: u32 = 0;
        let mut notes = String::new();
        let mut best: Option<(EmailDraft, f64)> = None;

        loop {
            self.logger.info(format!("Evaluating draft for {stakeholder}"));
            let evaluation = match self.evaluate(&draft, style_description).await {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    // Self-assessment is advisory; its failure never throws
                    // away a usable draft.
                    self.logger
                        .warn(format!("Evaluation failed for {stakeholder}: {e}"));
                    push_note(&mut notes, "Evaluation failed, returning current draft");
                    return Ok(self.finalize(task, draft, None, notes, rounds_used));
                }
            };

            let score = evaluation.overall_score.clamp(0.0, 10.0);
            self.logger.info_with(
                format!("Draft for {stakeholder} scored {score:.1}/10"),
                json!({ "score": score, "round": rounds_used }),
            );
            if rounds_used == 0 {
                push_note(&mut notes, &format!("Initial quality score: {score:.1}/10"));
            } else {
                push_note(
                    &mut notes,
                    &format!("Round {rounds_used} score: {score:.1}/10"),
                );
            }

            if best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((draft.clone(), score));
            }

            if score >= self.settings.quality_threshold {
                push_note(&mut notes, "Quality acceptable, no further refinement");
                return Ok(self.finalize(task, draft, Some(score), notes, rounds_used));
            }
            if rounds_used >= self.settings.max_refine_rounds {
                push_note(&mut notes, "Refinement budget exhausted");
                return Ok(self.finalize(task, draft, Some(score), notes, rounds_used));
            }

            self.check_cancelled(&stakeholder)?;
            self.logger.info(format!(
                "Score below threshold, refining draft for {stakeholder} (round {})",
                rounds_used + 1
            ));

            match self
                .refine(&draft, &evaluation, task, style_description, &task_vars)
                .await
            {
                Ok(refined) => {
                    draft = refined;
                    rounds_used += 1;
                }
                Err(e) => {
                    self.logger
                        .warn(format!("Refinement failed for {stakeholder}: {e}"));
                    push_note(&mut notes, "Refinement failed, using best draft so far");
                    let (fallback, fallback_score) = best.take().unwrap_or((draft, score));
                    return Ok(self.finalize(
                        task,
                        fallback,
                        Some(fallback_score),
                        notes,
                        rounds_used,
                    ));
                }
            }
        }
    }

    // ── Prompt construction ─────────────────────────────────────────────

    fn generation_prompt(
        &self,
        task: &GenerationTask,
        task_vars: &TaskVars,
    ) -> std::result::Result<String, WriterError> {
        let template = match &task.spec {
            GenerationSpec::AiStyle { style_key } => get_style(style_key)
                .ok_or_else(|| WriterError::UnknownStyle(style_key.clone()))?
                .generation_prompt
                .to_string(),
            GenerationSpec::Template { prompt_template } => {
                // User templates describe the email; the output contract is
                // appended so parsing stays uniform across modes.
                format!(
                    "{prompt_template}\n\nFormat your response as JSON:\n{{\n    \"subject\": \"Email subject line\",\n    \"body\": \"Email body\"\n}}\n\nReturn ONLY the JSON, no additional text."
                )
            }
            GenerationSpec::Custom { instructions } => custom::build_custom_template(instructions),
        };
        Ok(task_vars.substitute(&template))
    }

    fn style_description(spec: &GenerationSpec) -> &'static str {
        match spec {
            GenerationSpec::AiStyle { style_key } => get_style(style_key)
                .map_or("professional", |style| style.description),
            GenerationSpec::Template { .. } => "the user-supplied template",
            GenerationSpec::Custom { .. } => "custom user-defined style",
        }
    }

    // ── Completion calls ────────────────────────────────────────────────

    async fn request_draft(
        &self,
        system_prompt: &str,
        prompt: &str,
        task_vars: &TaskVars,
    ) -> Result<EmailDraft> {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(prompt),
        ];
        let raw = self.client.complete(&messages, self.params).await?;

        let mut draft: EmailDraft = repair::parse_object(&raw)
            .map_err(|e| OutreachError::Parse(ParseError::Draft(e)))?;

        // The model occasionally echoes placeholders back; resolve them so
        // no known `{variable}` ever reaches a final email.
        if !vars::unresolved(&draft.subject).is_empty()
            || !vars::unresolved(&draft.body).is_empty()
        {
            draft.subject = task_vars.substitute(&draft.subject);
            draft.body = task_vars.substitute(&draft.body);
        }
        Ok(draft)
    }

    async fn evaluate(
        &self,
        draft: &EmailDraft,
        style_description: &str,
    ) -> Result<EvaluationReport> {
        let messages = [
            ChatMessage::system(writer_prompts::EVALUATION_SYSTEM_PROMPT),
            ChatMessage::user(writer_prompts::evaluation(draft, style_description)),
        ];
        let raw = self.client.complete(&messages, self.params).await?;
        repair::parse_object(&raw).map_err(|e| OutreachError::Parse(ParseError::Evaluation(e)))
    }

    async fn refine(
        &self,
        draft: &EmailDraft,
        evaluation: &EvaluationReport,
        task: &GenerationTask,
        style_description: &str,
        task_vars: &TaskVars,
    ) -> Result<EmailDraft> {
        let prompt = writer_prompts::refinement(
            draft,
            evaluation.overall_score,
            &evaluation.weaknesses,
            &evaluation.improvement_suggestions,
            style_description,
            &task.stakeholder.name,
            task.stakeholder.title_or_default(),
        );
        let refined = self
            .request_draft(writer_prompts::REFINEMENT_SYSTEM_PROMPT, &prompt, task_vars)
            .await?;
        if refined.subject.trim().is_empty() || refined.body.trim().is_empty() {
            return Err(OutreachError::Parse(ParseError::Draft(
                "refined draft was empty".into(),
            )));
        }
        Ok(refined)
    }

    // ── Terminal states ─────────────────────────────────────────────────

    fn finalize(
        &self,
        task: &GenerationTask,
        draft: EmailDraft,
        quality_score: Option<f64>,
        reflection_notes: String,
        rounds_used: u32,
    ) -> EmailResult {
        self.logger.info(format!(
            "Email complete for {} ({} refinement rounds)",
            task.stakeholder.name, rounds_used
        ));
        EmailResult {
            stakeholder_name: task.stakeholder.name.clone(),
            stakeholder_title: task.stakeholder.title_or_default().to_string(),
            email_subject: draft.subject,
            email_body: draft.body,
            quality_score,
            reflection_notes,
            rounds_used,
            generation_mode: task.spec.mode_name().to_string(),
        }
    }

    fn require_substance(
        draft: &EmailDraft,
        stakeholder: &str,
    ) -> std::result::Result<(), WriterError> {
        if draft.subject.trim().is_empty() || draft.body.trim().is_empty() {
            return Err(WriterError::EmptyDraft {
                stakeholder: stakeholder.to_string(),
            });
        }
        Ok(())
    }

    fn check_cancelled(&self, stakeholder: &str) -> std::result::Result<(), WriterError> {
        if self.cancel.is_cancelled() {
            return Err(WriterError::Cancelled {
                stakeholder: stakeholder.to_string(),
            });
        }
        Ok(())
    }
}

fn push_note(notes: &mut String, note: &str) {
    if !notes.is_empty() {
        notes.push_str(" | ");
    }
    notes.push_str(note);
}
