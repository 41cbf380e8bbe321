use std::path::PathBuf;
use std::time::Duration;

use cinedex_scanner::ScanConfig;
use thiserror::Error;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of days, got {value:?}")]
    InvalidDays { var: &'static str, value: String },
}

/// Process configuration, read once from `CINEDEX_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    pub bind_addr: String,
    pub ffprobe_path: PathBuf,
    /// Grace period before missing media files are purged. `None` keeps them.
    pub missing_retention: Option<Duration>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let missing_retention = match lookup("CINEDEX_MISSING_RETENTION_DAYS") {
            Some(value) if !value.trim().is_empty() => {
                let days: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidDays {
                    var: "CINEDEX_MISSING_RETENTION_DAYS",
                    value: value.clone(),
                })?;
                Some(Duration::from_secs(days * SECS_PER_DAY))
            }
            _ => None,
        };

        Ok(Self {
            db_path: lookup("CINEDEX_DB").unwrap_or_else(|| "cinedex.db".to_string()),
            bind_addr: lookup("CINEDEX_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            ffprobe_path: lookup("CINEDEX_FFPROBE")
                .unwrap_or_else(|| "ffprobe".to_string())
                .into(),
            missing_retention,
        })
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            missing_retention: self.missing_retention,
        }
    }
}
