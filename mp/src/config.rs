//! MedPrompt configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main MedPrompt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inference backend connection
    pub backend: BackendConfig,

    /// Chat session behaviour
    pub session: SessionConfig,

    /// Copy-to-clipboard behaviour
    pub clipboard: ClipboardConfig,

    /// Voice dictation
    pub dictation: DictationConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };

        candidates
            .iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Project-local `.medprompt.yml`, then `~/.config/medprompt/medprompt.yml`
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".medprompt.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("medprompt").join("medprompt.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Inference backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL the endpoint paths are appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-request deadline in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Chat session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long an error notice stays up, in milliseconds
    #[serde(rename = "notice-ttl-ms")]
    pub notice_ttl_ms: u64,
}

impl SessionConfig {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { notice_ttl_ms: 5_000 }
    }
}

/// Which clipboard copies go to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipboardKind {
    /// Operating system clipboard (needs the `system-clipboard` feature)
    #[default]
    System,
    /// In-process clipboard
    Memory,
}

/// Copy-to-clipboard behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// How long a "copied" flag stays set, in milliseconds
    #[serde(rename = "feedback-ttl-ms")]
    pub feedback_ttl_ms: u64,

    pub backend: ClipboardKind,
}

impl ClipboardConfig {
    pub fn feedback_ttl(&self) -> Duration {
        Duration::from_millis(self.feedback_ttl_ms)
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            feedback_ttl_ms: 2_000,
            backend: ClipboardKind::default(),
        }
    }
}

/// Voice dictation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// Speech-to-text command line; dictation is unavailable when unset
    pub command: Option<String>,

    /// Recognition language
    pub language: String,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            command: None,
            language: crate::dictation::DEFAULT_LANGUAGE.to_string(),
        }
    }
}
