//! Config validation: checks with user-friendly error messages.

use crate::schema::{GenerationBackend, StudioConfig};
use thiserror::Error;
use url::Url;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &StudioConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_conversion(config, &mut report);
    validate_generation(config, &mut report);
    validate_editor(config, &mut report);
    report
}

fn check_url(report: &mut ValidationReport, path: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.error(path, format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => report.error(path, format!("invalid URL '{value}': {e}")),
    }
}

fn validate_conversion(config: &StudioConfig, report: &mut ValidationReport) {
    let endpoint = config.conversion_endpoint();
    check_url(report, "conversion.endpoint", endpoint);

    if let Some(c) = &config.conversion {
        if c.timeout_ms == Some(0) {
            report.error("conversion.timeoutMs", "timeout must be greater than zero");
        }
        let has_id = c.app_id.as_deref().is_some_and(|s| !s.is_empty());
        let has_key = c.api_key.as_deref().is_some_and(|s| !s.is_empty());
        if has_id != has_key {
            report.error(
                "conversion",
                "appId and apiKey must be set together (MJML_APP_ID / MJML_API_KEY)",
            );
        }
    }

    if endpoint.contains("api.mjml.io") && config.conversion_credentials().is_none() {
        report.warn(
            "conversion",
            "api.mjml.io requires MJML_APP_ID and MJML_API_KEY; conversions will fail",
        );
    }
}

fn validate_generation(config: &StudioConfig, report: &mut ValidationReport) {
    if let Some(g) = &config.generation {
        if g.timeout_ms == Some(0) {
            report.error("generation.timeoutMs", "timeout must be greater than zero");
        }
        if let Some(url) = &g.copy_endpoint {
            check_url(report, "generation.copyEndpoint", url);
        }
        if let Some(url) = &g.html_endpoint {
            check_url(report, "generation.htmlEndpoint", url);
        }
        if let Some(url) = &g.draft_endpoint {
            check_url(report, "generation.draftEndpoint", url);
        }
    }

    match config.generation_backend() {
        GenerationBackend::Openai => {
            check_url(report, "generation.openaiBaseUrl", config.openai_base_url());
            if config.openai_api_key().is_none() {
                report.warn(
                    "generation.apiKey",
                    "openai backend selected without an API key (OPENAI_API_KEY)",
                );
            }
        }
        GenerationBackend::Endpoint => {
            if config.copy_endpoint().is_none() || config.html_endpoint().is_none() {
                report.warn(
                    "generation",
                    "copyEndpoint/htmlEndpoint not set; the pipeline command is unavailable",
                );
            }
        }
    }
}

fn validate_editor(config: &StudioConfig, report: &mut ValidationReport) {
    if config.editor.as_ref().and_then(|e| e.debounce_ms) == Some(0) {
        report.error("editor.debounceMs", "debounce must be greater than zero");
    }
}
