//! Prompt for the per-stakeholder context retriever.

use crate::model::StakeholderRecord;

pub const CONTEXT_SYSTEM_PROMPT: &str =
    "You are an expert research analyst extracting role-relevant passages from reports.";

const CONTEXT_EXTRACTION_PROMPT: &str = r#"You are an expert research analyst. Extract the information from the research report below that pertains to one specific stakeholder, for use in crafting a personalized email to them.

Focus on:
- Information directly related to their responsibilities
- Projects or initiatives they are involved in
- Challenges or opportunities in their area
- Recent achievements or developments
- Any quotes or mentions of this person

If the stakeholder is not mentioned directly, extract information related to their role and responsibilities instead. Keep the result concise but informative (2-4 paragraphs maximum). Return only the extracted text; if nothing in the report is relevant to this role, return nothing.
"#;

/// Full context-extraction prompt for one stakeholder against a (possibly
/// truncated) report window.
pub fn context_extraction(stakeholder: &StakeholderRecord, report_window: &str) -> String {
    format!(
        "{CONTEXT_EXTRACTION_PROMPT}\nStakeholder Information:\nName: {}\nTitle: {}\nDetails: {}\n\nResearch Report:\n{}",
        stakeholder.name,
        stakeholder.title_or_default(),
        stakeholder.details_or_default(),
        report_window,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_stakeholder_and_report() {
        let stakeholder = StakeholderRecord {
            name: "Dr. Jane Smith".into(),
            title: Some("CMO".into()),
            details: None,
        };
        let prompt = context_extraction(&stakeholder, "quality scores dipped");
        assert!(prompt.contains("Dr. Jane Smith"));
        assert!(prompt.contains("CMO"));
        assert!(prompt.contains("No details available"));
        assert!(prompt.contains("quality scores dipped"));
    }
}
