//! Proseeds Run Configuration
//!
//! Handles parsing and management of proseeds.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching proseeds.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProseedsConfig {
    /// Target protocol (FTP, RTSP, HTTP, SMTP, SIP)
    #[serde(default)]
    pub protocol: String,

    /// Seed and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Model endpoint settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline tuning knobs
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

impl ProseedsConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: ProseedsConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check required fields before a run. Configuration failures are
    /// fatal and abort before any seed is processed.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.protocol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "missing required field: protocol".to_string(),
            ));
        }
        if self.paths.seed_dir.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "missing required field: paths.seed_dir".to_string(),
            ));
        }
        Ok(())
    }

    /// Output directory, defaulting to `<seed_dir>/enriched`.
    pub fn output_dir(&self) -> std::path::PathBuf {
        match &self.paths.output_dir {
            Some(dir) => std::path::PathBuf::from(dir),
            None => Path::new(&self.paths.seed_dir).join("enriched"),
        }
    }
}

/// Seed and output locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// Directory of seed files (top-level regular files only)
    #[serde(default)]
    pub seed_dir: String,

    /// Output directory; defaults to `<seed_dir>/enriched`
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name
    #[serde(default = "default_model_name")]
    pub name: String,

    /// OpenAI-compatible endpoint; None picks the mode's default
    #[serde(default)]
    pub api_url: Option<String>,

    /// API key; falls back to OPENAI_API_KEY for remote endpoints
    #[serde(default)]
    pub api_key: Option<String>,

    /// Local endpoint (Ollama-style), no key required
    #[serde(default)]
    pub use_local: bool,

    /// Transport mode: "instruct" (completions) or "chat"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Sampling temperature for enrichment requests
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Overall token ceiling per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_model_name() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_mode() -> String {
    "instruct".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> usize {
    2048
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            api_url: None,
            api_key: None,
            use_local: false,
            mode: default_mode(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Seeds inspected for the corpus-wide missing-type pass
    #[serde(default = "default_max_corpus_sample")]
    pub max_corpus_sample: usize,

    /// Maximum missing types per enrichment request (subset size cap)
    #[serde(default = "default_max_subset_size")]
    pub max_subset_size: usize,

    /// Enrichment variants requested per seed
    #[serde(default = "default_variants_per_seed")]
    pub variants_per_seed: usize,

    /// Model call attempts per variant
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Fixed sleep between attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Tokens held back from the prompt budget
    #[serde(default = "default_safety_margin")]
    pub safety_margin_tokens: usize,

    /// Random seed for variant sampling; None draws from entropy
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_max_corpus_sample() -> usize {
    10
}

fn default_max_subset_size() -> usize {
    2
}

fn default_variants_per_seed() -> usize {
    1
}

fn default_retries() -> usize {
    5
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_safety_margin() -> usize {
    50
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            max_corpus_sample: default_max_corpus_sample(),
            max_subset_size: default_max_subset_size(),
            variants_per_seed: default_variants_per_seed(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            safety_margin_tokens: default_safety_margin(),
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProseedsConfig::default();
        assert_eq!(config.advanced.max_subset_size, 2);
        assert_eq!(config.advanced.variants_per_seed, 1);
        assert_eq!(config.advanced.max_corpus_sample, 10);
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.model.temperature, 0.5);
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
protocol = "FTP"

[paths]
seed_dir = "seeds/ftp"
output_dir = "out"

[model]
name = "qwen2.5:7b"
use_local = true
mode = "chat"

[advanced]
max_subset_size = 3
variants_per_seed = 2
rng_seed = 42
"#;
        let config: ProseedsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.protocol, "FTP");
        assert_eq!(config.paths.seed_dir, "seeds/ftp");
        assert!(config.model.use_local);
        assert_eq!(config.model.mode, "chat");
        assert_eq!(config.advanced.max_subset_size, 3);
        assert_eq!(config.advanced.rng_seed, Some(42));
        // Untouched knobs keep their defaults
        assert_eq!(config.advanced.retries, 5);
    }

    #[test]
    fn test_validate_requires_protocol_and_seed_dir() {
        let mut config = ProseedsConfig::default();
        assert!(config.validate().is_err());
        config.protocol = "FTP".to_string();
        assert!(config.validate().is_err());
        config.paths.seed_dir = "seeds".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_dir_defaults_under_seed_dir() {
        let mut config = ProseedsConfig::default();
        config.paths.seed_dir = "seeds/ftp".to_string();
        assert_eq!(config.output_dir(), Path::new("seeds/ftp").join("enriched"));
        config.paths.output_dir = Some("elsewhere".to_string());
        assert_eq!(config.output_dir(), Path::new("elsewhere"));
    }
}
