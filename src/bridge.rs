//! Subprocess adapter: one JSON request on stdin, `LOG:`-prefixed event
//! lines streamed to stdout while the run is in flight, then the final
//! response object as the last line. The consuming backend splits on the
//! prefix to persist logs incrementally while waiting for the answer.

use crate::agents::{Orchestrator, Request, Response};
use crate::events::{LiveSink, LogEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

pub const LOG_PREFIX: &str = "LOG:";

/// One event as one framed stdout line.
pub fn format_log_line(event: &LogEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("{LOG_PREFIX}{json}"),
        // LogEvent serialization is infallible in practice; keep the frame
        // valid even if that ever changes.
        Err(_) => format!(
            "{LOG_PREFIX}{{\"level\":\"error\",\"agent\":\"bridge\",\"message\":\"unserializable log event\"}}"
        ),
    }
}

/// Serialize the terminal response as the final stdout line.
pub fn format_response_line(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        format!("{{\"success\":false,\"error\":\"response serialization failed: {e}\",\"logs\":[]}}")
    })
}

/// Parse the raw stdin payload, turning a malformed request into the same
/// total failure shape the orchestrator produces.
pub fn parse_request(input: &str) -> Result<Request, Response> {
    serde_json::from_str(input)
        .map_err(|e| Response::failure(format!("invalid request: {e}"), Vec::new()))
}

/// Run one request/response exchange over stdin/stdout.
///
/// `timeout` bounds the whole run; expiry cancels in-flight work and the
/// orchestrator reports the cancellation in the final response. Ctrl-C does
/// the same. Always emits exactly one terminal response line.
pub async fn run(orchestrator: &Orchestrator, timeout: Option<Duration>) -> std::io::Result<()> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;

    let request = match parse_request(&input) {
        Ok(request) => request,
        Err(response) => {
            println!("{}", format_response_line(&response));
            return Ok(());
        }
    };

    let cancel = CancellationToken::new();
    if let Some(limit) = timeout {
        let watchdog = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            watchdog.cancel();
        });
    }
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let sink: LiveSink = Arc::new(|event: &LogEvent| {
        println!("{}", format_log_line(event));
    });

    let response = orchestrator.handle(request, cancel, Some(sink)).await;
    println!("{}", format_response_line(&response));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LogLevel, Logger, collect_events, log_channel};
    use serde_json::Value;

    #[tokio::test]
    async fn log_lines_are_prefixed_json() {
        let (tx, rx) = log_channel();
        let collector = collect_events(rx, None);
        let logger = Logger::new(tx, "Orchestrator").with_correlation_id("wf-1");
        logger.info("starting");
        drop(logger);
        let events = collector.await.unwrap();

        let line = format_log_line(&events[0]);
        assert!(line.starts_with(LOG_PREFIX));
        let payload: Value = serde_json::from_str(&line[LOG_PREFIX.len()..]).unwrap();
        assert_eq!(payload["level"], "info");
        assert_eq!(payload["agent"], "Orchestrator");
        assert_eq!(payload["correlation_id"], "wf-1");
        assert_eq!(events[0].level, LogLevel::Info);
    }

    #[test]
    fn malformed_request_becomes_a_failure_response() {
        let response = parse_request("{not json").unwrap_err();
        assert!(!response.success);
        let line = format_response_line(&response);
        let payload: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("invalid request"));
        assert!(payload["logs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn request_wire_shape_parses() {
        let request = parse_request(
            r#"{"action": "extract_stakeholders", "workflowId": "wf-9",
                "reportInput": {"type": "text", "content": "report"}}"#,
        )
        .unwrap();
        assert_eq!(request.workflow_id(), Some("wf-9"));
    }

    #[test]
    fn response_line_uses_boundary_field_names() {
        use crate::model::EmailResult;
        let response = Response {
            success: true,
            stakeholders: None,
            company_summary: None,
            emails: Some(vec![EmailResult {
                stakeholder_name: "Ada".into(),
                stakeholder_title: "CTO".into(),
                email_subject: "Hello".into(),
                email_body: "Body".into(),
                quality_score: Some(8.5),
                reflection_notes: "Initial quality score: 8.5/10".into(),
                rounds_used: 0,
                generation_mode: "ai_style".into(),
            }]),
            failed: Some(Vec::new()),
            error: None,
            logs: Vec::new(),
        };

        let payload: Value = serde_json::from_str(&format_response_line(&response)).unwrap();
        let email = &payload["emails"][0];
        assert_eq!(email["email_subject"], "Hello");
        assert_eq!(email["email_body"], "Body");
        assert!((email["quality_score"].as_f64().unwrap() - 8.5).abs() < f64::EPSILON);
        // Null payload sections are omitted, not serialized as null.
        assert!(payload.get("stakeholders").is_none());
        assert!(payload.get("error").is_none());
    }
}
