//! Built-in generation-style library for `ai_style` mode.

pub struct StyleConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub generation_prompt: &'static str,
}

pub fn get_style(key: &str) -> Option<&'static StyleConfig> {
    STYLES.iter().find(|s| s.key == key)
}

pub fn list_styles() -> &'static [StyleConfig] {
    &STYLES
}

static STYLES: [StyleConfig; 3] = [
    StyleConfig {
        key: "technical_direct",
        name: "Technical and Direct",
        description: "Concise, specification-focused cold email grounded in concrete data",
        generation_prompt: r#"You are writing a technical cold email to a professional who values data and specifics. Be precise and evidence-based.

**CRITICAL COLD EMAIL RULES:**
- Maximum 150 words
- Lead with a specific metric or challenge from the research report
- Include 1-2 concrete data points
- Focus on measurable outcomes
- Clear, simple call to action

**Stakeholder Information:**
Name: {stakeholder_name}
Title: {stakeholder_title}
Role Details: {stakeholder_details}

**Company Context:**
Company: {company_name}
Report Summary: {company_summary}

**Specific Insights from the Report:**
{relevant_context}

**Email Structure:**
1. Data hook (1 sentence): reference a specific fact from their report
2. Solution + proof (2-3 sentences): measurable value with concrete numbers
3. Call to action (1 sentence): simple next step with a timeframe

Format your response as JSON:
{
    "subject": "Email subject line (under 60 characters, specific to their challenge)",
    "body": "Full email body (under 150 words)"
}

Return ONLY the JSON, no additional text."#,
    },
    StyleConfig {
        key: "warm_introduction",
        name: "Warm Introduction",
        description: "Relationship-first opener that references shared context before any ask",
        generation_prompt: r#"You are writing a warm, personable cold email. Build rapport first; the ask comes last and stays small.

**CRITICAL COLD EMAIL RULES:**
- Maximum 150 words
- Open with something specific to this person or their work from the report
- Conversational but professional tone
- One light-touch call to action

**Stakeholder Information:**
Name: {stakeholder_name}
Title: {stakeholder_title}
Role Details: {stakeholder_details}

**Company Context:**
Company: {company_name}
Report Summary: {company_summary}

**Specific Insights from the Report:**
{relevant_context}

**Email Structure:**
1. Personal opener (1-2 sentences): recognize their work or a recent development
2. Bridge (2-3 sentences): connect their priorities to the value you bring
3. Soft ask (1 sentence): low-commitment next step

Format your response as JSON:
{
    "subject": "Email subject line (under 60 characters, personal not salesy)",
    "body": "Full email body (under 150 words)"
}

Return ONLY the JSON, no additional text."#,
    },
    StyleConfig {
        key: "executive_brief",
        name: "Executive Brief",
        description: "Outcome-led summary for senior leaders, framed around strategic priorities",
        generation_prompt: r#"You are writing to a senior executive. Their time is scarce: lead with the business outcome and keep every sentence load-bearing.

**CRITICAL COLD EMAIL RULES:**
- Maximum 120 words
- First sentence states the strategic problem or opportunity from the report
- Frame value in business terms (cost, risk, growth), not features
- One decisive call to action

**Stakeholder Information:**
Name: {stakeholder_name}
Title: {stakeholder_title}
Role Details: {stakeholder_details}

**Company Context:**
Company: {company_name}
Report Summary: {company_summary}

**Specific Insights from the Report:**
{relevant_context}

**Email Structure:**
1. Strategic hook (1 sentence): the outcome at stake, from their report
2. Value statement (2 sentences): what changes and by how much
3. Call to action (1 sentence): direct, time-bound

Format your response as JSON:
{
    "subject": "Email subject line (under 50 characters, outcome-focused)",
    "body": "Full email body (under 120 words)"
}

Return ONLY the JSON, no additional text."#,
    },
];
