use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The MJML markup currently being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceDocument(String);

impl SourceDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only documents never reach the conversion service.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SourceDocument {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceDocument {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Outcome of the most recent conversion attempt.
///
/// Html and error are variants of one value, so a result can never carry
/// both. Every transition replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderResult {
    #[default]
    Empty,
    Html { html: String },
    Error { message: String },
}

impl RenderResult {
    pub fn html(html: impl Into<String>) -> Self {
        RenderResult::Html { html: html.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RenderResult::Error {
            message: message.into(),
        }
    }

    pub fn as_html(&self) -> Option<&str> {
        match self {
            RenderResult::Html { html } => Some(html),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            RenderResult::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RenderResult::Empty)
    }
}

/// Display selector for the preview surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Preview,
    Code,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Preview => "preview",
            ViewMode::Code => "code",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(ViewMode::Preview),
            "code" | "source" => Ok(ViewMode::Code),
            other => Err(format!("unknown view mode '{other}' (expected preview or code)")),
        }
    }
}

/// Stage of the prompt → copy → html wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Copy,
    Html,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Copy => f.write_str("copy"),
            PipelineStage::Html => f.write_str("html"),
        }
    }
}

/// Point-in-time view of an editor, published after every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub source: SourceDocument,
    pub result: RenderResult,
    pub loading: bool,
    /// A debounced conversion is scheduled but has not fired yet.
    pub pending: bool,
    /// Sequence number of the latest conversion issued (0 before the first).
    pub seq: u64,
    pub updated_at: DateTime<Utc>,
}

impl EditorSnapshot {
    /// Nothing scheduled and nothing in flight.
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.pending
    }
}
