use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ─── Log event model ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One structured, attributable log entry.
///
/// Events are append-only: agents emit them as work happens and a single
/// consumer drains them in arrival order, so the trace for a run is already
/// chronologically ordered across concurrent tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub agent: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

pub type EventSender = mpsc::UnboundedSender<LogEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<LogEvent>;

/// Create the per-run log channel.
pub fn log_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Optional side-channel invoked for each event as it arrives, before the
/// event is stored. The bridge uses this to stream `LOG:` lines while the
/// run is still in flight.
pub type LiveSink = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Drain the channel on a dedicated task, preserving arrival order.
///
/// Resolves once every sender is dropped, yielding the full ordered trace.
pub fn collect_events(
    mut rx: EventReceiver,
    live_sink: Option<LiveSink>,
) -> JoinHandle<Vec<LogEvent>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            if let Some(sink) = &live_sink {
                sink(&event);
            }
            events.push(event);
        }
        events
    })
}

// ─── Agent-scoped emitter ───────────────────────────────────────────────────

/// Handle an agent uses to emit events under its own label.
///
/// Cloning is cheap; each agent (and each writer task) gets its own labelled
/// clone so traces stay attributable under fan-out.
#[derive(Clone)]
pub struct Logger {
    tx: EventSender,
    agent: String,
    correlation_id: Option<String>,
}

impl Logger {
    pub fn new(tx: EventSender, agent: impl Into<String>) -> Self {
        Self {
            tx,
            agent: agent.into(),
            correlation_id: None,
        }
    }

    /// Same channel, different source label.
    pub fn for_agent(&self, agent: impl Into<String>) -> Self {
        Self {
            tx: self.tx.clone(),
            agent: agent.into(),
            correlation_id: self.correlation_id.clone(),
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogLevel::Debug, message.into(), None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message.into(), None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warning, message.into(), None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message.into(), None);
    }

    pub fn info_with(&self, message: impl Into<String>, metadata: Value) {
        self.emit(LogLevel::Info, message.into(), Some(metadata));
    }

    fn emit(&self, level: LogLevel, message: String, metadata: Option<Value>) {
        tracing::debug!(agent = self.agent.as_str(), %level, "{message}");
        // Receiver dropping mid-run only loses trace output, never the result.
        let _ = self.tx.send(LogEvent {
            level,
            agent: self.agent.clone(),
            message,
            correlation_id: self.correlation_id.clone(),
            metadata,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (tx, rx) = log_channel();
        let collector = collect_events(rx, None);

        let logger = Logger::new(tx, "Orchestrator");
        logger.info("first");
        logger.warn("second");
        logger.error("third");
        drop(logger);

        let events = collector.await.unwrap();
        let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(events[1].level, LogLevel::Warning);
    }

    #[tokio::test]
    async fn interleaved_senders_share_one_ordered_trace() {
        let (tx, rx) = log_channel();
        let collector = collect_events(rx, None);

        let a = Logger::new(tx.clone(), "EmailWriter-1");
        let b = a.for_agent("EmailWriter-2");
        drop(tx);

        a.info("a1");
        b.info("b1");
        a.info("a2");
        drop(a);
        drop(b);

        let events = collector.await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].agent, "EmailWriter-1");
        assert_eq!(events[1].agent, "EmailWriter-2");
    }

    #[tokio::test]
    async fn live_sink_sees_every_event() {
        let (tx, rx) = log_channel();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: LiveSink = Arc::new(move |event: &LogEvent| {
            sink_seen.lock().unwrap().push(event.message.clone());
        });
        let collector = collect_events(rx, Some(sink));

        let logger = Logger::new(tx, "Planner").with_correlation_id("wf-42");
        logger.info("queued");
        logger.info("done");
        drop(logger);

        let events = collector.await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id.as_deref(), Some("wf-42"));
        assert_eq!(*seen.lock().unwrap(), vec!["queued", "done"]);
    }

    #[test]
    fn level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LogLevel::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(LogLevel::Info.to_string(), "info");
    }
}
