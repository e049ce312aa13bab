//! Gateway configuration

use crate::error::{Error, Result};
use crate::sign::HmacSigner;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level gateway settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL used for proxy links when the request carries none
    pub site_url: String,
    pub sign: SignConfig,
    pub tasks: TaskConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignConfig {
    pub secret: String,
    /// 0 means signatures never expire
    pub link_expiration_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5244".to_string(),
            sign: SignConfig::default(),
            tasks: TaskConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sign.secret.is_empty() {
            return Err(Error::Config("sign.secret must not be empty".to_string()));
        }
        if self.tasks.queue_capacity == 0 {
            return Err(Error::Config(
                "tasks.queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn link_expiration(&self) -> Option<chrono::Duration> {
        match self.sign.link_expiration_hours {
            0 => None,
            hours => Some(chrono::Duration::hours(i64::from(hours))),
        }
    }

    pub fn signer(&self) -> Result<HmacSigner> {
        HmacSigner::new(self.sign.secret.as_bytes(), self.link_expiration())
    }
}
