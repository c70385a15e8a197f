//! `studio-config` — mjml-studio runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, conversion, generation, editor, logging)
//! - YAML loading with path discovery
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation and redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_file_path, load_raw};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    ConversionConfig, EditorConfig, GenerationBackend, GenerationConfig, LoggingConfig,
    ServerConfig, StudioConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. It runs
/// before logging is set up, so validation errors are folded into the
/// returned error and warnings are left for the caller to report.
pub async fn load_and_prepare(path: &Path) -> Result<StudioConfig> {
    let value = load_raw(path).await?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    prepare(value, apply_env_overrides)
}

/// Same pipeline as [`load_and_prepare`] over an in-memory value and env map.
pub fn prepare_with(
    value: serde_json::Value,
    env: &std::collections::HashMap<String, String>,
) -> Result<StudioConfig> {
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    prepare(value, |c| apply_env_overrides_with(c, env))
}

fn prepare(
    value: serde_json::Value,
    overrides: impl FnOnce(StudioConfig) -> StudioConfig,
) -> Result<StudioConfig> {
    let config: StudioConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(overrides(config));

    let report = validate(&config);
    if !report.is_valid() {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!(errors.join("; "));
    }

    Ok(config)
}
