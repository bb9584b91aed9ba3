use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SafeshareError, SafeshareResult};
use crate::types::{ExpiryDays, FileStatus};

/// Top-level client configuration (loaded from safeshare.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeshareConfig {
    pub server: ServerConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the file API (default: http://localhost:8000/api/files/)
    pub base_url: String,
    /// Refuse plaintext HTTP endpoints instead of warning
    pub enforce_tls: bool,
    /// Per-request timeout in seconds (default: 60)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Visibility of uploads when no flag is given
    pub default_status: FileStatus,
    /// Expiry sent with uploads when no flag is given (server default when unset)
    pub default_expiry_days: Option<u32>,
    /// Files above this size are refused before encryption (0 = no limit)
    pub max_upload_bytes: u64,
    /// Directory decrypted downloads are saved into
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/files/".into(),
            enforce_tls: false,
            timeout_secs: 60,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            default_status: FileStatus::Private,
            default_expiry_days: None,
            // Largest upload the backend accepts (admin quota)
            max_upload_bytes: 10 * 1024 * 1024,
            download_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Text,
        }
    }
}

impl SafeshareConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> SafeshareResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| SafeshareError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> SafeshareResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SafeshareError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SafeshareResult<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(SafeshareError::Config("server.base_url is empty".into()));
        }
        if self.server.timeout_secs == 0 {
            return Err(SafeshareError::Config(
                "server.timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(days) = self.transfer.default_expiry_days {
            ExpiryDays::new(days).map_err(|e| {
                SafeshareError::Config(format!("transfer.default_expiry_days: {e}"))
            })?;
        }
        Ok(())
    }

    /// Configured default expiry, already range-checked by `validate`.
    pub fn default_expiry(&self) -> SafeshareResult<Option<ExpiryDays>> {
        self.transfer
            .default_expiry_days
            .map(ExpiryDays::new)
            .transpose()
    }
}
