//! Telemetry and structured logging components for mjml-studio.
//!
//! Handles subscriber setup (console + rolling NDJSON file), credential
//! redaction, and structured editor/pipeline event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, StudioEvent};
pub use logger::{init_console, init_logger};
pub use redact::redact_sensitive_data;
