//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` references in string leaves are substituted (uppercase
//!   `[A-Z_][A-Z0-9_]*` names only; `$${VAR}` escapes to a literal `${VAR}`).
//! - Well-known variables (`MJML_APP_ID`, `MJML_API_KEY`, ...) override the
//!   matching fields, so credentials never need to live in the file.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::schema::{ConversionConfig, GenerationConfig, LoggingConfig, ServerConfig, StudioConfig};

/// Matches `${VAR}` and the escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid"));

pub const ENV_MJML_APP_ID: &str = "MJML_APP_ID";
pub const ENV_MJML_API_KEY: &str = "MJML_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BIND: &str = "MJML_STUDIO_BIND";
pub const ENV_PORT: &str = "MJML_STUDIO_PORT";
pub const ENV_LOG: &str = "RUST_LOG";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let items: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(items?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let whole = &caps[0];
        let var_name = &caps[1];
        if whole.starts_with("$$") {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply well-known environment overrides from the process environment.
pub fn apply_env_overrides(config: StudioConfig) -> StudioConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply well-known environment overrides from a provided map.
pub fn apply_env_overrides_with(
    mut config: StudioConfig,
    env: &HashMap<String, String>,
) -> StudioConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(app_id) = get(ENV_MJML_APP_ID) {
        debug!(var = ENV_MJML_APP_ID, "Overriding conversion.appId from environment");
        config
            .conversion
            .get_or_insert_with(ConversionConfig::default)
            .app_id = Some(app_id);
    }
    if let Some(api_key) = get(ENV_MJML_API_KEY) {
        debug!(var = ENV_MJML_API_KEY, "Overriding conversion.apiKey from environment");
        config
            .conversion
            .get_or_insert_with(ConversionConfig::default)
            .api_key = Some(api_key);
    }
    if let Some(key) = get(ENV_OPENAI_API_KEY) {
        let generation = config.generation.get_or_insert_with(GenerationConfig::default);
        if generation.api_key.is_none() {
            generation.api_key = Some(key);
        }
    }
    if let Some(bind) = get(ENV_BIND) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind);
    }
    if let Some(port) = get(ENV_PORT).and_then(|p| p.parse::<u16>().ok()) {
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(level) = get(ENV_LOG) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }
    config
}
