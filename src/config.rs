//! Configuration management for ipsecmon

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{IpsecmonError, IpsecmonResult};

/// Main ipsecmon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsecmonConfig {
    /// Status command used with `--exec`
    #[serde(default)]
    pub status: StatusCommandConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCommandConfig {
    /// Daemon control binary
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Arguments producing the full status listing
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print JSON payloads
    #[serde(default)]
    pub pretty: bool,
}

fn default_binary() -> String {
    "ipsec".to_string()
}

fn default_args() -> Vec<String> {
    vec!["statusall".to_string()]
}

impl Default for StatusCommandConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: default_args(),
        }
    }
}

impl IpsecmonConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> IpsecmonResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| IpsecmonError::ConfigError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| IpsecmonError::ConfigError(format!("Failed to parse config: {}", e)))
    }
}
