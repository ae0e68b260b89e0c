// crates/mneme/src/config/file.rs
// Project configuration from <project>/.mneme/project.toml

use crate::error::ConfigError;
use crate::utils::non_blank;
use mneme_types::BackendKind;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-project directory holding config, .env and the memory stores
pub const PROJECT_DIR: &str = ".mneme";

/// Config file name inside `PROJECT_DIR`
pub const CONFIG_FILE: &str = "project.toml";

/// Project-level settings written by the hosting agent's setup.
///
/// Every key is optional: a file that exists but is empty (or was only
/// partially written) is a valid first-run state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Provider key that selects the memory backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// OpenAI credential (falls back to OPENAI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Chat model of the hosting agent, kept for round-tripping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "MemorySection::is_empty")]
    pub memory: MemorySection,

    /// Keys owned by other tools
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[memory]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
    /// Vector store location, relative paths resolve against the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    /// OpenAI-compatible base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_host: Option<String>,

    /// Probe the provider while constructing the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
}

impl MemorySection {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// State of a single string key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<'a> {
    /// Key not present
    Missing,
    /// Key present but empty or whitespace
    Blank,
    /// Key present with a value, exactly as written
    Value(&'a str),
}

impl<'a> Setting<'a> {
    pub fn of(value: Option<&'a str>) -> Self {
        match value {
            None => Self::Missing,
            Some(v) if v.trim().is_empty() => Self::Blank,
            Some(v) => Self::Value(v),
        }
    }

    /// The value with surrounding whitespace removed
    pub fn value(self) -> Option<&'a str> {
        match self {
            Self::Value(v) => Some(v.trim()),
            Self::Missing | Self::Blank => None,
        }
    }
}

impl ProjectConfig {
    /// Load the project config.
    ///
    /// `Ok(None)` when no config file exists. Errors only when a file exists
    /// but cannot be read or parsed.
    pub fn load(project_root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = Self::config_path(project_root);

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                debug!(path = %path.display(), "No project config file");
                return Ok(None);
            }
            Err(source) => return Err(ConfigError::Unreadable { path, source }),
        };

        let config = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "Loaded project config");
        Ok(Some(config))
    }

    /// Location of the config file for a project
    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// Minimal config selecting `kind`
    pub fn for_platform(kind: BackendKind) -> Self {
        Self {
            platform: Some(kind.platform_id().to_string()),
            ..Self::default()
        }
    }

    /// Write this config to the project, creating `.mneme/` if needed
    pub fn save(&self, project_root: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path(project_root);
        let write_err = |reason: String| ConfigError::Write {
            path: path.clone(),
            reason,
        };

        let contents = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&path, contents).map_err(|e| write_err(e.to_string()))?;

        debug!(path = %path.display(), "Wrote project config");
        Ok(path)
    }

    /// The provider key
    pub fn platform(&self) -> Setting<'_> {
        Setting::of(self.platform.as_deref())
    }

    /// OpenAI credential from the file, if non-blank
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) {
        let path = ProjectConfig::config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
platform = "OpenAI"
api_key = "sk-test"

[memory]
dimensions = 512
"#;
        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.platform(), Setting::Value("OpenAI"));
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.memory.dimensions, Some(512));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert_eq!(config.platform(), Setting::Missing);
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_blank_platform_is_distinct_from_missing() {
        let config: ProjectConfig = toml::from_str("platform = \"  \"").unwrap();
        assert_eq!(config.platform(), Setting::Blank);
        assert_eq!(config.platform().value(), None);
    }

    #[test]
    fn test_platform_value_kept_as_written() {
        let config: ProjectConfig = toml::from_str("platform = \" Gemini \"").unwrap();
        assert_eq!(config.platform(), Setting::Value(" Gemini "));
        assert_eq!(config.platform().value(), Some("Gemini"));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let config: ProjectConfig =
            toml::from_str("platform = \"OpenAI\"\nsearch_key = \"abc\"").unwrap();
        assert_eq!(
            config.extra.get("search_key").and_then(|v| v.as_str()),
            Some("abc")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_missing_project_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("does/not/exist");
        assert!(ProjectConfig::load(&root).unwrap().is_none());
    }

    #[test]
    fn test_load_project_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("plain-file");
        std::fs::write(&root, "not a directory").unwrap();
        assert!(ProjectConfig::load(&root).unwrap().is_none());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.platform(), Setting::Missing);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "platform = \"OpenAI");
        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &ProjectConfig::config_path(dir.path()));
    }

    #[test]
    fn test_load_wrong_type_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "platform = 42");
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_config_path_is_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(ProjectConfig::config_path(dir.path())).unwrap();
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(ConfigError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::for_platform(BackendKind::LocalVectorStore);
        config.memory.ollama_host = Some("http://gpu-box:11434".into());
        config
            .extra
            .insert("search_key".into(), toml::Value::String("abc".into()));

        let path = config.save(dir.path()).unwrap();
        assert!(path.ends_with(".mneme/project.toml"));

        let loaded = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.platform(), Setting::Value("Ollama"));
    }
}
