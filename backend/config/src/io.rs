//! Config file discovery and loading.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "mjml-studio.yaml";

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MJML_STUDIO_CONFIG";

/// Resolve the config file path.
/// Priority: explicit path > `MJML_STUDIO_CONFIG` > `./mjml-studio.yaml` >
/// `<user config dir>/mjml-studio/mjml-studio.yaml`.
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        let user = dir.join("mjml-studio").join(CONFIG_FILE_NAME);
        if user.exists() {
            return user;
        }
    }
    local
}

/// Read the config file as a JSON value tree.
///
/// Returns an empty object if the file doesn't exist (first run).
pub async fn load_raw(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    // An empty YAML document parses as null.
    Ok(if value.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let value = load_raw(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();
        let value = load_raw(&path).await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn invalid_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "editor: [unclosed").unwrap();
        let err = load_raw(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn explicit_path_wins() {
        let path = config_file_path(Some(Path::new("/etc/studio.yaml")));
        assert_eq!(path, PathBuf::from("/etc/studio.yaml"));
    }
}
