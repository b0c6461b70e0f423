use serde::{Deserialize, Serialize};
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use crate::error::AssuranceError;

/// Directory, relative to a model directory, where the editor keeps its own state.
pub const STATE_DIR: &str = ".gsn-editor";
pub const CONFIG_FILE: &str = "engine.toml";

/// Per-model-directory engine settings. Every field has a default, so an absent or partial
/// `engine.toml` is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extension (without the dot) of case documents.
    pub extension: String,
    /// File written by `GENERATE_MODEL_JSON`, relative to the model directory.
    pub model_json_file: String,
    /// Indentation used when writing case documents.
    pub indent: String,
    /// Spaces per level in the generated JSON file.
    pub json_indent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            extension: "gsn".to_string(),
            model_json_file: "model.json".to_string(),
            indent: "    ".to_string(),
            json_indent: 4,
        }
    }
}

impl EngineConfig {
    pub fn path_for(model_dir: &Path) -> PathBuf {
        model_dir.join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Read `<model_dir>/.gsn-editor/engine.toml`, falling back to defaults when there is none.
    pub fn load(model_dir: &Path) -> Result<EngineConfig, AssuranceError> {
        let path = EngineConfig::path_for(model_dir);
        tracing::debug!("Attempting to read engine config from: {:?}", &path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(EngineConfig::default());
        }
        let content = read_to_string(&path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EngineConfig::load(dir.path()).unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        fs::write(
            EngineConfig::path_for(dir.path()),
            "extension = \"case\"\njson_indent = 2\n",
        )
        .unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.extension, "case");
        assert_eq!(config.json_indent, 2);
        assert_eq!(config.model_json_file, "model.json");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        fs::write(EngineConfig::path_for(dir.path()), "extension = [").unwrap();
        assert!(matches!(
            EngineConfig::load(dir.path()),
            Err(AssuranceError::Parse(_))
        ));
    }
}
