//! mjml-studio configuration schema.
//!
//! Every section and field is optional on disk; `defaults::apply_all_defaults`
//! fills the gaps and the accessor methods below read the effective values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_BIND, DEFAULT_CONVERSION_ENDPOINT, DEFAULT_CONVERSION_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS,
    DEFAULT_GENERATION_TIMEOUT_MS, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL, DEFAULT_MODEL,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_PORT,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioConfig {
    /// Preview server bind settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// MJML → HTML conversion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionConfig>,

    /// Copy / HTML generation backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    /// Editor behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    /// Endpoint accepting `{ "mjml": ... }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Basic-auth user half (application id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Basic-auth password half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Which implementation backs the two pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// JSON endpoints speaking `{prompt, files}` / `{emailCopy}`.
    #[default]
    Endpoint,
    /// Direct OpenAI-compatible chat completions.
    Openai,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<GenerationBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_endpoint: Option<String>,
    /// Multipart `{prompt, pdfFile}` endpoint returning a starter MJML draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet period after the last edit before a conversion fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    /// MJML document the editor starts with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Effective values
// ---------------------------------------------------------------------------

impl StudioConfig {
    pub fn bind_address(&self) -> String {
        let server = self.server.as_ref();
        let bind = server
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND);
        let port = server.and_then(|s| s.port).unwrap_or(DEFAULT_PORT);
        format!("{bind}:{port}")
    }

    pub fn conversion_endpoint(&self) -> &str {
        self.conversion
            .as_ref()
            .and_then(|c| c.endpoint.as_deref())
            .unwrap_or(DEFAULT_CONVERSION_ENDPOINT)
    }

    /// `(app_id, api_key)` when both halves are configured.
    pub fn conversion_credentials(&self) -> Option<(&str, &str)> {
        let c = self.conversion.as_ref()?;
        match (c.app_id.as_deref(), c.api_key.as_deref()) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => Some((id, key)),
            _ => None,
        }
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_millis(
            self.conversion
                .as_ref()
                .and_then(|c| c.timeout_ms)
                .unwrap_or(DEFAULT_CONVERSION_TIMEOUT_MS),
        )
    }

    pub fn generation_backend(&self) -> GenerationBackend {
        self.generation
            .as_ref()
            .and_then(|g| g.backend)
            .unwrap_or_default()
    }

    pub fn copy_endpoint(&self) -> Option<&str> {
        self.generation.as_ref()?.copy_endpoint.as_deref()
    }

    pub fn html_endpoint(&self) -> Option<&str> {
        self.generation.as_ref()?.html_endpoint.as_deref()
    }

    pub fn draft_endpoint(&self) -> Option<&str> {
        self.generation.as_ref()?.draft_endpoint.as_deref()
    }

    pub fn openai_base_url(&self) -> &str {
        self.generation
            .as_ref()
            .and_then(|g| g.openai_base_url.as_deref())
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.generation
            .as_ref()?
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }

    pub fn model(&self) -> &str {
        self.generation
            .as_ref()
            .and_then(|g| g.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(
            self.generation
                .as_ref()
                .and_then(|g| g.timeout_ms)
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_MS),
        )
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(
            self.editor
                .as_ref()
                .and_then(|e| e.debounce_ms)
                .unwrap_or(DEFAULT_DEBOUNCE_MS),
        )
    }

    pub fn initial_source(&self) -> Option<&str> {
        self.editor.as_ref()?.initial_source.as_deref()
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .unwrap_or(DEFAULT_LOG_DIR)
    }
}
