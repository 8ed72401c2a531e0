use crate::error::{MissionError, Result};
use crate::paths;
use completion_client::ClientSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Whole collection in one JSON array, rewritten on every mutation.
    #[default]
    Json,
    /// Embedded redb database, one key per task.
    Redb,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Json => "json",
            StorageBackend::Redb => "redb",
        }
    }

    fn default_path(self) -> &'static str {
        match self {
            StorageBackend::Json => paths::DEFAULT_JSON_TASKS,
            StorageBackend::Redb => paths::DEFAULT_REDB_TASKS,
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(StorageBackend::Json),
            "redb" => Ok(StorageBackend::Redb),
            other => Err(MissionError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Relative paths are resolved against the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn tasks_path(&self, root: &Path) -> PathBuf {
        let configured = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.backend.default_path()));
        paths::resolve(root, &configured)
    }
}

// ---------------------------------------------------------------------------
// CompletionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    completion_client::client::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    completion_client::client::DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    completion_client::client::DEFAULT_TIMEOUT_SECS
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    /// Client settings with the API key read from `api_key_env`.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            api_key_env: self.api_key_env.clone(),
            api_key: std::env::var(&self.api_key_env).ok(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage: StorageConfig::default(),
            completion: CompletionConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load `.missionfit/config.yaml`, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn tasks_path(&self, root: &Path) -> PathBuf {
        self.storage.tasks_path(root)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.completion.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "completion.timeout_secs must be greater than 0".to_string(),
            });
        }

        if !(self.completion.base_url.starts_with("http://")
            || self.completion.base_url.starts_with("https://"))
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "completion.base_url '{}' is not an http(s) URL",
                    self.completion.base_url
                ),
            });
        }

        if self.completion.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "completion.model is empty".to_string(),
            });
        }

        let key_set = std::env::var(&self.completion.api_key_env)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !key_set {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "{} is not set: plan generation will return degraded results",
                    self.completion.api_key_env
                ),
            });
        }

        if let Some(path) = &self.storage.path {
            let ext = path.extension().and_then(|e| e.to_str());
            let mismatched = matches!(
                (self.storage.backend, ext),
                (StorageBackend::Redb, Some("json")) | (StorageBackend::Json, Some("redb"))
            );
            if mismatched {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "storage.path '{}' does not look like a {} store",
                        path.display(),
                        self.storage.backend
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
