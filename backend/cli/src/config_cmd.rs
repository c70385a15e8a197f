//! `mjml-studio config`: show the effective configuration.

use std::path::Path;

use anyhow::Result;

use studio_config::{collect_redacted_paths, redact, validate, StudioConfig};

use crate::terminal_output::{heading, note_info, note_warn};

pub fn run(config: &StudioConfig, path: &Path) -> Result<()> {
    if path.exists() {
        note_info(&format!("Config file: {}", path.display()));
    } else {
        note_info(&format!("No config file at {}; using defaults", path.display()));
    }

    println!("{}", render(config)?);

    for warning in validate(config).warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    Ok(())
}

/// The effective config as YAML, secrets redacted, plus the list of
/// redacted fields.
fn render(config: &StudioConfig) -> Result<String> {
    let value = serde_json::to_value(config)?;
    let mut out = serde_yaml::to_string(&redact(&value))?;

    let redacted = collect_redacted_paths(&value);
    if !redacted.is_empty() {
        out.push('\n');
        out.push_str(&heading("Redacted"));
        for path in redacted {
            out.push_str(&format!("\n  {path}"));
        }
    }
    Ok(out)
}
