use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::error::{KeyhoundError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub validator: ValidatorConfig,
    pub redaction: RedactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Lines of context captured before and after each match.
    pub context_lines: usize,
    /// Consumer-side entropy filter; the scanner itself never applies it.
    pub entropy_threshold: f64,
    /// Provider names to scan for. None means all registered providers.
    pub provider_filter: Option<Vec<String>>,
    /// Files larger than this are skipped.
    pub max_file_size_kb: u64,
    /// Directory names excluded from the walk.
    pub skip_paths: Vec<String>,
    /// File suffixes eligible for scanning.
    pub file_extensions: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            entropy_threshold: 4.5,
            provider_filter: None,
            max_file_size_kb: 1024,
            skip_paths: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "__pycache__".to_string(),
                "venv".to_string(),
                ".venv".to_string(),
                "target".to_string(),
                "dist".to_string(),
                "build".to_string(),
            ],
            file_extensions: vec![
                ".py".to_string(),
                ".js".to_string(),
                ".ts".to_string(),
                ".env".to_string(),
                ".json".to_string(),
                ".yaml".to_string(),
                ".yml".to_string(),
                ".toml".to_string(),
                ".xml".to_string(),
                ".properties".to_string(),
                ".conf".to_string(),
                ".cfg".to_string(),
                ".ini".to_string(),
                ".go".to_string(),
                ".rb".to_string(),
                ".rs".to_string(),
                ".php".to_string(),
                ".sh".to_string(),
                ".txt".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub enabled: bool,
    pub timeout_seconds: u64,
    pub max_concurrent: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_seconds: 10,
            max_concurrent: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub prefix_chars: usize,
    pub suffix_chars: usize,
    pub min_length: usize,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            prefix_chars: 8,
            suffix_chars: 4,
            min_length: 12,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, erroring if unreadable.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| KeyhoundError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Search the conventional config locations, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        let config_paths = ["keyhound.toml", ".keyhound.toml", "config/keyhound.toml"];
        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(Path::new(path)) {
                    Ok(config) => {
                        info!("Loaded config from {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }
}
