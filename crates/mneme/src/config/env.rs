// crates/mneme/src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use super::file::{ProjectConfig, Setting};
use mneme_types::BackendKind;
use tracing::{debug, info, warn};

/// API keys loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// OpenAI API key (OPENAI_API_KEY)
    pub openai: Option<String>,
}

impl ApiKeys {
    /// Load API keys from environment variables
    pub fn from_env() -> Self {
        let keys = Self {
            openai: Self::read_key("OPENAI_API_KEY"),
        };
        keys.log_status();
        keys
    }

    /// Read a single API key from environment, filtering empty values
    fn read_key(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|k| !k.trim().is_empty())
    }

    /// Log which API keys are available (without exposing values)
    fn log_status(&self) {
        if self.openai.is_some() {
            debug!(keys = ?["OpenAI"], "API keys loaded");
        } else {
            debug!("No API keys in environment");
        }
    }

    /// Get a summary of available keys
    pub fn summary(&self) -> String {
        if self.openai.is_some() {
            "OpenAI".to_string()
        } else {
            "None".to_string()
        }
    }
}

/// Embedding endpoint overrides from environment variables
#[derive(Debug, Clone, Default)]
pub struct EmbeddingsConfig {
    /// Custom embedding dimensions (MNEME_EMBEDDING_DIMENSIONS)
    pub dimensions: Option<usize>,
    /// OpenAI-compatible base URL (OPENAI_BASE_URL)
    pub openai_base_url: Option<String>,
    /// Ollama server (OLLAMA_HOST)
    pub ollama_host: Option<String>,
}

impl EmbeddingsConfig {
    /// Load embeddings configuration from environment variables
    pub fn from_env() -> Self {
        let dimensions = std::env::var("MNEME_EMBEDDING_DIMENSIONS")
            .ok()
            .and_then(|d| parse_dimensions(&d));

        if let Some(dims) = dimensions {
            debug!(dimensions = dims, "Custom embedding dimensions configured");
        }

        Self {
            dimensions,
            openai_base_url: read_nonempty("OPENAI_BASE_URL"),
            ollama_host: read_nonempty("OLLAMA_HOST"),
        }
    }
}

/// Configuration validation result
#[derive(Debug)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for ConfigValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Environment configuration - all env vars in one place
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_keys: ApiKeys,
    pub embeddings: EmbeddingsConfig,
    /// Force memory off for this process (MNEME_DISABLE_MEMORY)
    pub disable_memory: bool,
    /// Log level override (MNEME_LOG)
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load all environment configuration (call once at startup)
    pub fn load() -> Self {
        let disable_memory = parse_bool_env("MNEME_DISABLE_MEMORY").unwrap_or(false);
        if disable_memory {
            info!("MNEME_DISABLE_MEMORY is set - persistent memory disabled");
        }

        Self {
            api_keys: ApiKeys::from_env(),
            embeddings: EmbeddingsConfig::from_env(),
            disable_memory,
            log_level: Self::log_level_from_env(),
        }
    }

    /// MNEME_LOG, readable before logging is set up
    pub fn log_level_from_env() -> Option<String> {
        read_nonempty("MNEME_LOG")
    }

    /// Validate the environment together with the project config (if any)
    pub fn validate(&self, config: Option<&ProjectConfig>) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        let Some(config) = config else {
            validation.add_warning(
                "No project config found. Run `mneme init` to enable persistent memory.",
            );
            return validation;
        };

        let kind = match config.platform() {
            Setting::Missing => {
                validation.add_warning("No `platform` set; memory stays disabled until one is chosen.");
                None
            }
            Setting::Blank => {
                validation.add_warning("`platform` is empty; memory stays disabled until one is chosen.");
                None
            }
            Setting::Value(id) => match BackendKind::from_platform_id(id) {
                Some(kind) => Some(kind),
                None => {
                    validation.add_error(format!(
                        "Unsupported platform '{}'. Valid options: {}",
                        id,
                        BackendKind::supported_list()
                    ));
                    None
                }
            },
        };

        if kind == Some(BackendKind::RemoteOpenAi)
            && config.api_key().is_none()
            && self.api_keys.openai.is_none()
        {
            validation.add_error("OpenAI platform selected but no api_key in config and OPENAI_API_KEY is not set.");
        }

        if config.memory.dimensions == Some(0) || self.embeddings.dimensions == Some(0) {
            validation.add_error("Embedding dimensions must be greater than zero.");
        }

        if self.disable_memory {
            validation.add_warning("MNEME_DISABLE_MEMORY is set; memory will be deferred.");
        }

        validation
    }
}

fn read_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_dimensions(value: &str) -> Option<usize> {
    match value.trim().parse() {
        Ok(dims) => Some(dims),
        Err(_) => {
            warn!(value, "Ignoring invalid MNEME_EMBEDDING_DIMENSIONS");
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_env(name: &str) -> Option<bool> {
    parse_bool(&std::env::var(name).ok()?)
}
