//! Evaluation and refinement prompts for the email writer's reflection loop.

use crate::model::EmailDraft;

pub const GENERATION_SYSTEM_PROMPT: &str =
    "You are a professional email writer specializing in personalized outreach.";

pub const EVALUATION_SYSTEM_PROMPT: &str = "You are an expert email quality reviewer.";

pub const REFINEMENT_SYSTEM_PROMPT: &str =
    "You are a professional email writer specializing in refinement.";

/// Six-criterion rubric scoring prompt. The scores are a self-assessment,
/// interpreted only as higher-is-better to gate refinement.
pub fn evaluation(draft: &EmailDraft, email_style: &str) -> String {
    format!(
        r#"You are an expert cold email quality reviewer. Evaluate this email against cold email best practices.

Email to Evaluate:
Subject: {subject}
Body: {body}

Intended Style: {email_style}

**Evaluation Criteria (score each 0-10):**

1. **Style Adherence**: Does the email match the intended style?
2. **Personalization**: Is it clearly written for this specific recipient, referencing their role and context? Generic emails score 0-3.
3. **Relevance**: Does it reference specific facts or challenges from the research rather than generic claims?
4. **Clarity**: Is it direct and easy to follow, with no preamble or filler?
5. **Call-to-Action Strength**: Is the next step simple and specific? "15-minute call next week" scores higher than "let's connect."
6. **Professionalism**: Is the tone appropriate and the writing polished?

Provide your evaluation as JSON:
{{
    "style_adherence": <score>,
    "personalization": <score>,
    "relevance": <score>,
    "clarity": <score>,
    "call_to_action": <score>,
    "professionalism": <score>,
    "overall_score": <average of all scores>,
    "strengths": ["strength 1", "strength 2"],
    "weaknesses": ["weakness 1", "weakness 2"],
    "improvement_suggestions": "Specific suggestions for improvement"
}}

Return ONLY the JSON, no additional text."#,
        subject = draft.subject,
        body = draft.body,
    )
}

/// Refinement prompt carrying the previous draft plus evaluation feedback.
pub fn refinement(
    draft: &EmailDraft,
    overall_score: f64,
    weaknesses: &[String],
    improvement_suggestions: &str,
    email_style: &str,
    stakeholder_name: &str,
    stakeholder_title: &str,
) -> String {
    format!(
        r#"You are a professional cold email expert. Refine this email based on evaluation feedback.

Original Email:
Subject: {subject}
Body: {body}

Evaluation Feedback:
Overall Score: {overall_score:.1}/10
Weaknesses: {weaknesses}
Improvement Suggestions: {improvement_suggestions}

Email Style: {email_style}

Stakeholder Context:
Name: {stakeholder_name}
Title: {stakeholder_title}

**Refinement Priorities:**
1. Cut ruthlessly: remove any sentence that does not add direct value
2. Lead with a specific fact or challenge from the research
3. Strengthen the call to action: make the next step clear and simple
4. Keep it under 150 words

Format your response as JSON:
{{
    "subject": "Refined email subject line (under 60 characters)",
    "body": "Refined email body (under 150 words)"
}}

Return ONLY the JSON, no additional text."#,
        subject = draft.subject,
        body = draft.body,
        weaknesses = weaknesses.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EmailDraft {
        EmailDraft {
            subject: "Cut sepsis delays".into(),
            body: "Short body.".into(),
        }
    }

    #[test]
    fn evaluation_prompt_carries_draft_and_rubric() {
        let prompt = evaluation(&draft(), "Technical and Direct");
        assert!(prompt.contains("Cut sepsis delays"));
        assert!(prompt.contains("style_adherence"));
        assert!(prompt.contains("call_to_action"));
        assert!(prompt.contains("overall_score"));
    }

    #[test]
    fn refinement_prompt_carries_feedback() {
        let prompt = refinement(
            &draft(),
            5.5,
            &["too generic".into(), "weak CTA".into()],
            "Name a concrete metric",
            "Technical and Direct",
            "Dr. Jane Smith",
            "CMO",
        );
        assert!(prompt.contains("5.5/10"));
        assert!(prompt.contains("too generic, weak CTA"));
        assert!(prompt.contains("Name a concrete metric"));
        assert!(prompt.contains("Dr. Jane Smith"));
    }
}
