//! Custom-instruction mode: the user supplies free-form generation
//! instructions which are wrapped with stakeholder context and the JSON
//! output contract.

const MIN_INSTRUCTION_CHARS: usize = 20;
const MAX_INSTRUCTION_CHARS: usize = 2000;

/// Wrapper template. `{custom_instructions}` is the user's text; the other
/// placeholders come from the task variable set.
const CUSTOM_PROMPT_TEMPLATE: &str = r#"You are generating a cold outreach email based on custom user instructions.

**CRITICAL REQUIREMENTS (apply to ALL custom emails):**
1. **Report Specificity**: Reference specific challenges, metrics, or opportunities from the research report
2. **Brevity**: Keep under 150 words unless the user explicitly requests longer
3. **Directness**: Get to the point quickly, no preamble
4. **Clear CTA**: Simple, actionable next step

**Stakeholder Information:**
Name: {stakeholder_name}
Title: {stakeholder_title}
Role Details: {stakeholder_details}

**Company Context:**
Company: {company_name}
Report Summary: {company_summary}

**Specific Insights from the Report:**
{relevant_context}

**User's Custom Instructions:**
{custom_instructions}

**Instructions:**
1. Follow the user's custom instructions above
2. Reference specific insights from the research report
3. Use the stakeholder's role and priorities to personalize
4. Keep it concise and direct

Generate an email following the user's custom instructions while adhering to the critical requirements. Format as JSON:
{
    "subject": "Email subject line",
    "body": "Email body"
}

Return ONLY the JSON, no additional text."#;

/// Build the full custom-mode template, with the user's instructions spliced
/// in. Task placeholders remain for the caller to substitute.
pub fn build_custom_template(custom_instructions: &str) -> String {
    CUSTOM_PROMPT_TEMPLATE.replace("{custom_instructions}", custom_instructions)
}

/// Reject empty, trivially short, or oversized instructions before any task
/// is dispatched.
pub fn validate_custom_instructions(instructions: &str) -> Result<(), &'static str> {
    let trimmed = instructions.trim();
    if trimmed.is_empty() {
        return Err("custom instructions cannot be empty");
    }
    if trimmed.chars().count() < MIN_INSTRUCTION_CHARS {
        return Err("custom instructions are too short (minimum 20 characters)");
    }
    if instructions.chars().count() > MAX_INSTRUCTION_CHARS {
        return Err("custom instructions are too long (maximum 2000 characters)");
    }
    Ok(())
}
