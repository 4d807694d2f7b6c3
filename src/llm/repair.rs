//! One-shot repair for malformed structured output.
//!
//! Models routinely wrap JSON in code fences or surround it with prose. The
//! repair is a single bounded pass (strip fences, slice to the outermost
//! object or array), never an open-ended reprompt loop. Output that still
//! fails to parse surfaces as a typed error upstream.

use serde::de::DeserializeOwned;

/// Remove ```json fences and leading/trailing whitespace.
pub fn strip_code_fences(text: &str) -> &str {
    let mut out = text.trim();
    if let Some(rest) = out.strip_prefix("```") {
        out = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim_end();
    }
    out
}

/// Slice to the outermost `{...}` span, dropping surrounding prose.
pub fn extract_object(text: &str) -> Option<&str> {
    extract_span(text, '{', '}')
}

/// Slice to the outermost `[...]` span, dropping surrounding prose.
pub fn extract_array(text: &str) -> Option<&str> {
    extract_span(text, '[', ']')
}

fn extract_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a JSON object response, repairing once before giving up.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    parse_with(raw, extract_object)
}

/// Parse a JSON array response, repairing once before giving up.
pub fn parse_array<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    parse_with(raw, extract_array)
}

fn parse_with<T: DeserializeOwned>(
    raw: &str,
    extract: fn(&str) -> Option<&str>,
) -> Result<T, String> {
    if let Ok(value) = serde_json::from_str(raw.trim()) {
        return Ok(value);
    }

    let cleaned = strip_code_fences(raw);
    let candidate = extract(cleaned).unwrap_or(cleaned);
    serde_json::from_str(candidate).map_err(|e| format!("{e}; output began: {}", preview(raw)))
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 120;
    let trimmed = text.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Draft {
        subject: String,
        body: String,
    }

    #[test]
    fn parses_clean_json_directly() {
        let draft: Draft =
            parse_object(r#"{"subject": "Hi", "body": "Quick note."}"#).unwrap();
        assert_eq!(draft.subject, "Hi");
    }

    #[test]
    fn strips_json_code_fences() {
        let raw = "```json\n{\"subject\": \"Hi\", \"body\": \"Note.\"}\n```";
        let draft: Draft = parse_object(raw).unwrap();
        assert_eq!(draft.body, "Note.");
    }

    #[test]
    fn strips_bare_fences() {
        let raw = "```\n{\"subject\": \"Hi\", \"body\": \"Note.\"}\n```";
        assert!(parse_object::<Draft>(raw).is_ok());
    }

    #[test]
    fn slices_past_leading_prose() {
        let raw = "Here is the email you asked for:\n{\"subject\": \"Hi\", \"body\": \"Note.\"} Hope it helps!";
        let draft: Draft = parse_object(raw).unwrap();
        assert_eq!(draft.subject, "Hi");
    }

    #[test]
    fn parses_array_with_surrounding_text() {
        let raw = "Sure!\n[{\"subject\": \"A\", \"body\": \"a\"}]\nDone.";
        let drafts: Vec<Draft> = parse_array(raw).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn unparseable_output_fails_with_preview() {
        let err = parse_object::<Draft>("I could not generate an email, sorry.").unwrap_err();
        assert!(err.contains("I could not generate"));
    }

    #[test]
    fn repair_is_single_shot_not_fabrication() {
        // Truncated JSON stays an error; nothing is invented.
        let err = parse_object::<Draft>("{\"subject\": \"Hi\", \"body\": \"cut of").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn extract_object_requires_both_braces() {
        assert_eq!(extract_object("no braces here"), None);
        assert_eq!(extract_object("} reversed {"), None);
        assert_eq!(extract_object("a {\"k\": 1} b"), Some("{\"k\": 1}"));
    }
}
