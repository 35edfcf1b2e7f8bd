//! Migration configuration

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_DOCUMENT_WORKERS: usize = 4;

/// When set, the user config file is never read
pub const TEST_MODE_ENV: &str = "VAULTLIFT_TEST_MODE";

const ENV_IMAGE_ROOT: &str = "VAULTLIFT_IMAGE_ROOT";
const ENV_OUTPUT_DIR: &str = "VAULTLIFT_OUTPUT_DIR";
const ENV_CONCURRENCY: &str = "VAULTLIFT_CONCURRENCY";
const ENV_TIMEOUT: &str = "VAULTLIFT_TIMEOUT";
const ENV_STORAGE_BACKEND: &str = "VAULTLIFT_STORAGE_BACKEND";
const ENV_STORAGE_ENDPOINT: &str = "VAULTLIFT_STORAGE_ENDPOINT";
const ENV_STORAGE_TOKEN: &str = "VAULTLIFT_STORAGE_TOKEN";

/// Where uploaded images go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// HTTP PUT to an object store endpoint
    #[default]
    Http,
    /// Copy into a local (often web-served) directory
    Directory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "directory" | "dir" => Ok(Self::Directory),
            other => Err(ConfigError::invalid(
                "storage.backend",
                format!("unknown backend '{other}', expected 'http' or 'directory'"),
            )),
        }
    }
}

/// Storage backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Upload endpoint (http backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Base of the URLs written into documents; defaults to the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    /// Target directory (directory backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Sent as `Authorization: Bearer <token>` (http backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl StorageConfig {
    /// Base URL for remote locations
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .or(self.endpoint.as_deref())
    }
}

/// Complete configuration of a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory tree holding the local images
    pub image_root: PathBuf,
    /// Where rewritten documents are written
    pub output_dir: PathBuf,
    /// Replace source documents instead of writing to `output_dir`
    pub overwrite: bool,
    /// Upload workers per document
    pub concurrency_limit: usize,
    /// Wait bound for one document's uploads
    pub timeout_seconds: u64,
    /// Documents processed at once
    pub document_workers: usize,
    pub storage: StorageConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("images"),
            output_dir: PathBuf::from("output"),
            overwrite: false,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            document_workers: DEFAULT_DOCUMENT_WORKERS,
            storage: StorageConfig::default(),
        }
    }
}

/// Values given explicitly on the command line
///
/// `None` leaves the lower-precedence value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub image_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub overwrite: Option<bool>,
    pub concurrency_limit: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub document_workers: Option<usize>,
    pub backend: Option<StorageBackend>,
    pub endpoint: Option<String>,
    pub public_base_url: Option<String>,
    pub storage_directory: Option<PathBuf>,
}

impl MigrationConfig {
    /// Load configuration with precedence: defaults < file < env < overrides
    ///
    /// The result is validated before it is returned.
    pub fn load(overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let config = Self::resolve(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply every layer without validating the result
    pub fn resolve(overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let mut config = Self::from_file_or_default(overrides.config_file.as_deref())?;
        config.apply_env()?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load config from the given or default file, or fall back to defaults
    ///
    /// An explicitly given file must exist; the default file is optional.
    fn from_file_or_default(config_file: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = config_file {
            return Self::from_file(path);
        }

        if std::env::var(TEST_MODE_ENV).is_ok() {
            return Ok(Self::default());
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn apply_env(&mut self) -> ConfigResult<()> {
        if let Some(root) = env_var(ENV_IMAGE_ROOT) {
            self.image_root = PathBuf::from(root);
        }
        if let Some(dir) = env_var(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(limit) = env_var(ENV_CONCURRENCY) {
            self.concurrency_limit = parse_number(ENV_CONCURRENCY, &limit)?;
        }
        if let Some(timeout) = env_var(ENV_TIMEOUT) {
            self.timeout_seconds = parse_number(ENV_TIMEOUT, &timeout)?;
        }
        if let Some(backend) = env_var(ENV_STORAGE_BACKEND) {
            self.storage.backend = backend.parse()?;
        }
        if let Some(endpoint) = env_var(ENV_STORAGE_ENDPOINT) {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(token) = env_var(ENV_STORAGE_TOKEN) {
            self.storage.bearer_token = Some(token);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(root) = &overrides.image_root {
            self.image_root = root.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(overwrite) = overrides.overwrite {
            self.overwrite = overwrite;
        }
        if let Some(limit) = overrides.concurrency_limit {
            self.concurrency_limit = limit;
        }
        if let Some(timeout) = overrides.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(workers) = overrides.document_workers {
            self.document_workers = workers;
        }
        if let Some(backend) = overrides.backend {
            self.storage.backend = backend;
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.storage.endpoint = Some(endpoint.clone());
        }
        if let Some(url) = &overrides.public_base_url {
            self.storage.public_base_url = Some(url.clone());
        }
        if let Some(dir) = &overrides.storage_directory {
            self.storage.directory = Some(dir.clone());
        }
    }

    /// Check value ranges and backend requirements
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::invalid("concurrency_limit", "must be at least 1"));
        }
        if self.document_workers == 0 {
            return Err(ConfigError::invalid("document_workers", "must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::invalid("timeout_seconds", "must be at least 1"));
        }

        match self.storage.backend {
            StorageBackend::Http => {
                let endpoint = self.storage.endpoint.as_deref().unwrap_or_default();
                if endpoint.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "storage.endpoint",
                        "required for the http backend",
                    ));
                }
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(ConfigError::invalid(
                        "storage.endpoint",
                        format!("'{endpoint}' is not an http(s) URL"),
                    ));
                }
            }
            StorageBackend::Directory => {
                if self.storage.directory.is_none() {
                    return Err(ConfigError::invalid(
                        "storage.directory",
                        "required for the directory backend",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Wait bound for one document's uploads
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get default config file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("vaultlift");
        Ok(config_dir.join("config.toml"))
    }

    /// Create a new config file with example values
    pub fn create_example(path: &Path) -> ConfigResult<()> {
        let example = r#"# Vaultlift Configuration
# Location: ~/.config/vaultlift/config.toml

# Directory holding the images your notes embed (searched recursively)
image_root = "./images"

# Rewritten documents are written here, mirroring the source layout
output_dir = "./output"

# Replace the source documents instead of writing to output_dir
overwrite = false

# Upload workers per document
concurrency_limit = 8

# Seconds to wait for one document's uploads before giving up on the rest
timeout_seconds = 60

# Documents processed at the same time
document_workers = 4

[storage]
# "http" (PUT to an object store) or "directory" (copy into a folder)
backend = "http"

# Upload endpoint; images are PUT to {endpoint}/{document}/{image}
endpoint = "https://bucket.s3.ap-northeast-2.amazonaws.com"

# Base of the URLs written into documents (default: endpoint)
# public_base_url = "https://cdn.example.com"

# Target folder for backend = "directory"
# directory = "./published"

# Bearer token (can also be set via VAULTLIFT_STORAGE_TOKEN env var)
# bearer_token = "..."
"#;

        write_file(path, example)
    }

    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        write_file(path, &contents)
    }

    /// Display the current configuration as TOML, secrets masked
    pub fn display_as_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Display the current configuration as JSON, secrets masked
    pub fn display_as_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(&self.redacted())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.storage.bearer_token.is_some() {
            config.storage.bearer_token = Some("********".to_string());
        }
        config
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, format!("'{value}' is not a number")))
}

fn write_file(path: &Path, contents: &str) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
