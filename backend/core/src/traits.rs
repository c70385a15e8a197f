use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StudioResult;

/// Remote MJML → HTML compiler.
///
/// Treated as an opaque, possibly slow, possibly failing service.
#[async_trait]
pub trait ConversionGateway: Send + Sync {
    /// Short name used in logs (e.g., "mjml-api").
    fn name(&self) -> &str;

    /// Compile `mjml` and return the rendered HTML document.
    async fn convert(&self, mjml: &str) -> StudioResult<String>;
}

/// First pipeline stage: prompt → email copy.
#[async_trait]
pub trait CopyWriter: Send + Sync {
    fn name(&self) -> &str;

    async fn write_copy(&self, request: &CopyRequest) -> StudioResult<GeneratedCopy>;
}

/// Second pipeline stage: email copy → HTML document.
#[async_trait]
pub trait HtmlComposer: Send + Sync {
    fn name(&self) -> &str;

    async fn compose_html(&self, request: &HtmlRequest) -> StudioResult<GeneratedHtml>;
}

/// Prompt (plus an optional PDF) → starter MJML document for the editor.
#[async_trait]
pub trait DraftWriter: Send + Sync {
    fn name(&self) -> &str;

    async fn write_draft(&self, request: &DraftRequest) -> StudioResult<String>;
}

/// Wire shape of the copy-generation request. Only file names travel,
/// never file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRequest {
    pub prompt: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlRequest {
    pub email_copy: String,
}

/// A PDF uploaded with a draft request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Multipart draft request: a `prompt` field and an optional `pdfFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftRequest {
    pub prompt: String,
    pub pdf: Option<Attachment>,
}

impl DraftRequest {
    /// Nothing worth sending: blank prompt and no PDF.
    pub fn is_empty(&self) -> bool {
        self.prompt.trim().is_empty() && self.pdf.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCopy {
    pub copy: String,
    pub provider: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHtml {
    pub html: String,
    pub provider: String,
    pub latency_ms: u64,
}
