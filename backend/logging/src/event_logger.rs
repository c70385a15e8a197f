//! Studio Event Logger
//!
//! Structured editor and pipeline events, emitted through `tracing` under
//! the `studio_events` target so the NDJSON file layer captures them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudioEvent {
    ConversionIssued {
        seq: u64,
        bytes: usize,
    },
    ConversionApplied {
        seq: u64,
        ok: bool,
        latency_ms: u64,
    },
    /// A response arrived for a request that a newer one had superseded.
    ConversionDiscarded {
        seq: u64,
        latest: u64,
    },
    StageCompleted {
        stage: String,
        provider: String,
        latency_ms: u64,
    },
    StageFailed {
        stage: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub event: StudioEvent,
}

impl EventLogEntry {
    pub fn new(source: &str, event: StudioEvent) -> Self {
        Self {
            source: source.to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a studio event, scrubbing any free-text error before it is emitted.
    pub fn log_event(source: &str, mut event: StudioEvent) {
        if let StudioEvent::StageFailed { error, .. } = &mut event {
            *error = redact_sensitive_data(error);
        }

        let failed = matches!(event, StudioEvent::StageFailed { .. });
        let entry = EventLogEntry::new(source, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();

        if failed {
            warn!(target: "studio_events", event = %json, "Studio event");
        } else {
            info!(target: "studio_events", event = %json, "Studio event");
        }
    }
}
