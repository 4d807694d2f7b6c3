//! `{variable}` substitution for prompt templates.
//!
//! Templates and custom instructions reference a fixed variable set filled
//! from the task. Substitution is plain string replacement (templates may
//! legitimately contain JSON example braces, so no strict templating
//! engine); the writer agent uses [`unresolved`] to uphold the guarantee
//! that no known placeholder survives into a final email.

use crate::model::GenerationTask;

/// The known variable set, in documentation order.
pub const KNOWN_PLACEHOLDERS: [&str; 7] = [
    "{stakeholder_name}",
    "{stakeholder_first_name}",
    "{stakeholder_title}",
    "{stakeholder_details}",
    "{company_name}",
    "{company_summary}",
    "{relevant_context}",
];

/// Resolved values for one task.
#[derive(Debug, Clone)]
pub struct TaskVars {
    pub stakeholder_name: String,
    pub stakeholder_first_name: String,
    pub stakeholder_title: String,
    pub stakeholder_details: String,
    pub company_name: String,
    pub company_summary: String,
    pub relevant_context: String,
}

impl TaskVars {
    pub fn from_task(task: &GenerationTask) -> Self {
        let name = task.stakeholder.name.clone();
        let first_name = name
            .split_whitespace()
            .next()
            .unwrap_or(name.as_str())
            .to_string();
        Self {
            stakeholder_name: name,
            stakeholder_first_name: first_name,
            stakeholder_title: task.stakeholder.title_or_default().to_string(),
            stakeholder_details: task.stakeholder.details_or_default().to_string(),
            company_name: task.company_name.clone(),
            company_summary: task.company_summary.clone(),
            relevant_context: task.relevant_context.clone(),
        }
    }

    fn pairs(&self) -> [(&'static str, &str); 7] {
        [
            ("{stakeholder_name}", &self.stakeholder_name),
            ("{stakeholder_first_name}", &self.stakeholder_first_name),
            ("{stakeholder_title}", &self.stakeholder_title),
            ("{stakeholder_details}", &self.stakeholder_details),
            ("{company_name}", &self.company_name),
            ("{company_summary}", &self.company_summary),
            ("{relevant_context}", &self.relevant_context),
        ]
    }

    /// Replace every known placeholder with its value.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (placeholder, value) in self.pairs() {
            if out.contains(placeholder) {
                out = out.replace(placeholder, value);
            }
        }
        out
    }
}

/// Known placeholders still present in `text`. Unknown `{...}` tokens are
/// left alone; only the documented variable set counts.
pub fn unresolved(text: &str) -> Vec<&'static str> {
    KNOWN_PLACEHOLDERS
        .into_iter()
        .filter(|p| text.contains(*p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationSpec, StakeholderRecord};

    fn task() -> GenerationTask {
        GenerationTask {
            stakeholder: StakeholderRecord {
                name: "Dr. Jane Smith".into(),
                title: Some("CMO".into()),
                details: Some("Oversees quality initiatives".into()),
            },
            company_name: "Mercy General".into(),
            company_summary: "Regional hospital network".into(),
            relevant_context: "Quality scores slipped last quarter".into(),
            spec: GenerationSpec::AiStyle {
                style_key: "technical_direct".into(),
            },
        }
    }

    #[test]
    fn substitutes_every_known_placeholder() {
        let vars = TaskVars::from_task(&task());
        let template = "To {stakeholder_name} ({stakeholder_title}) at {company_name}: \
                        {relevant_context}. Hi {stakeholder_first_name}!";
        let out = vars.substitute(template);
        assert!(out.contains("Dr. Jane Smith"));
        assert!(out.contains("Mercy General"));
        assert!(out.contains("Hi Dr.!"));
        assert!(unresolved(&out).is_empty());
    }

    #[test]
    fn unknown_tokens_are_preserved() {
        let vars = TaskVars::from_task(&task());
        let out = vars.substitute("{stakeholder_name} — {\"subject\": \"x\"} {not_a_var}");
        assert!(out.contains("{\"subject\": \"x\"}"));
        assert!(out.contains("{not_a_var}"));
        assert!(unresolved(&out).is_empty());
    }

    #[test]
    fn unresolved_reports_leftovers() {
        let leftover = unresolved("Dear {stakeholder_name}, greetings from {company_name}.");
        assert_eq!(
            leftover,
            vec!["{stakeholder_name}", "{company_name}"]
        );
    }

    #[test]
    fn first_name_falls_back_to_full_name() {
        let mut t = task();
        t.stakeholder.name = "Cher".into();
        let vars = TaskVars::from_task(&t);
        assert_eq!(vars.stakeholder_first_name, "Cher");
    }
}
