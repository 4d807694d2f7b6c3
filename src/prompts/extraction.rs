//! Prompts for the stakeholder extractor.

pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are an expert research analyst extracting structured data from reports.";

pub const STAKEHOLDER_EXTRACTION_PROMPT: &str = r#"You are an expert research analyst. Analyze the research report below and identify the key stakeholders mentioned in it.

For each stakeholder, extract:
1. Full name
2. Job title/role
3. Key responsibilities, areas of focus, and information useful for personalized outreach

Format your response as a JSON array of stakeholder objects:
[
  {
    "name": "Full Name",
    "title": "Job Title",
    "details": "Key information about this person and their role..."
  }
]

If the report names no identifiable stakeholders, return an empty array: []

IMPORTANT: Return ONLY the raw JSON array. Do not wrap it in markdown code blocks or add any explanatory text.

Research Report:
"#;

pub const COMPANY_SUMMARY_PROMPT: &str = r#"You are an expert research analyst. Extract a concise summary of the company described in the research report below, suitable as context for email outreach.

Focus on:
- Company name and industry
- Key products/services
- Strategic priorities
- Recent developments or challenges
- Market position and competitive landscape

Provide a 2-3 paragraph summary in a clear, professional tone. Return only the summary text.

Research Report:
"#;

/// Extraction prompt with the report appended.
pub fn stakeholder_extraction(report: &str) -> String {
    format!("{STAKEHOLDER_EXTRACTION_PROMPT}{report}")
}

/// Summary prompt with the report appended.
pub fn company_summary(report: &str) -> String {
    format!("{COMPANY_SUMMARY_PROMPT}{report}")
}
