use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

// ─── Report input ───────────────────────────────────────────────────────────

/// A research report as it arrives at the boundary: either resolved text or
/// a pointer to a remote resource some external collaborator must fetch and
/// extract before the text-bearing agents can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportInput {
    Text {
        content: String,
    },
    FileUrl {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

/// Seam for turning a [`ReportInput`] into plain text.
///
/// Remote-resource resolution (PDF/HTML download and extraction) belongs to
/// the caller's side of the boundary; the default resolver only accepts
/// inline text and rejects anything else with a clear error.
pub trait ReportResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        input: &'a ReportInput,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>>;
}

/// Accepts `type: "text"` only. The bridge runs with this resolver because
/// the consuming backend extracts file content before invoking the core.
pub struct InlineOnlyResolver;

impl ReportResolver for InlineOnlyResolver {
    fn resolve<'a>(
        &'a self,
        input: &'a ReportInput,
    ) -> Pin<Box<dyn Future<Output = Result<String, ReportError>> + Send + 'a>> {
        Box::pin(async move {
            match input {
                ReportInput::Text { content } => {
                    if content.trim().is_empty() {
                        Err(ReportError::Empty)
                    } else {
                        Ok(content.clone())
                    }
                }
                ReportInput::FileUrl { url, .. } => {
                    // Validate early so the caller sees a URL problem rather
                    // than a generic resolution failure.
                    if url::Url::parse(url).is_err() {
                        return Err(ReportError::InvalidUrl(url.clone()));
                    }
                    Err(ReportError::Unresolved(format!(
                        "file_url {url} must be extracted to text before reaching the core"
                    )))
                }
            }
        })
    }
}

// ─── Deterministic truncation ───────────────────────────────────────────────

/// Head-biased truncation to at most `max_chars` characters.
///
/// Reports regularly exceed the model's practical context window; the head
/// of a research report carries the summary and key findings, so the window
/// keeps the head and drops the tail. Deterministic for a given input.
pub fn truncate_report(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    // Cut back to the last line break so the window never ends mid-sentence.
    let cut = head.rfind('\n').unwrap_or(head.len());
    let mut out = head[..cut].trim_end().to_string();
    out.push_str("\n[report truncated]");
    out
}
