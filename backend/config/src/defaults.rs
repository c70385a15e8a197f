//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{
    ConversionConfig, EditorConfig, GenerationConfig, LoggingConfig, ServerConfig, StudioConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_CONVERSION_ENDPOINT: &str = "https://api.mjml.io/v1/render";
pub const DEFAULT_CONVERSION_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 120_000;

/// Quiet period between the last edit and the conversion request.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: StudioConfig) -> StudioConfig {
    let config = apply_server_defaults(config);
    let config = apply_conversion_defaults(config);
    let config = apply_generation_defaults(config);
    let config = apply_editor_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: StudioConfig) -> StudioConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    config
}

fn apply_conversion_defaults(mut config: StudioConfig) -> StudioConfig {
    let conversion = config.conversion.get_or_insert_with(ConversionConfig::default);
    conversion
        .endpoint
        .get_or_insert_with(|| DEFAULT_CONVERSION_ENDPOINT.to_string());
    conversion.timeout_ms.get_or_insert(DEFAULT_CONVERSION_TIMEOUT_MS);
    config
}

fn apply_generation_defaults(mut config: StudioConfig) -> StudioConfig {
    let generation = config.generation.get_or_insert_with(GenerationConfig::default);
    generation.backend.get_or_insert_with(Default::default);
    generation
        .openai_base_url
        .get_or_insert_with(|| DEFAULT_OPENAI_BASE_URL.to_string());
    generation.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    generation.timeout_ms.get_or_insert(DEFAULT_GENERATION_TIMEOUT_MS);
    config
}

fn apply_editor_defaults(mut config: StudioConfig) -> StudioConfig {
    let editor = config.editor.get_or_insert_with(EditorConfig::default);
    editor.debounce_ms.get_or_insert(DEFAULT_DEBOUNCE_MS);
    config
}

fn apply_logging_defaults(mut config: StudioConfig) -> StudioConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    config
}
