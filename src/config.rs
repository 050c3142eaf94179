//! Configuration.
//!
//! All sections are optional; missing keys fall back to their defaults.
//!
//! ```toml
//! [builder]
//! leak_check = true
//!
//! [windows]
//! string_capacity = 256
//!
//! [hidapi]
//! max_report_descriptor_len = 4096
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub builder: BuilderConfig,
    pub windows: WindowsConfig,
    pub hidapi: HidApiConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Warn when a descriptor is dropped while still owning its capability blob.
    pub leak_check: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            leak_check: cfg!(debug_assertions),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfig {
    /// UTF-16 units reserved for manufacturer / product string queries.
    pub string_capacity: usize,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            string_capacity: 256,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidApiConfig {
    /// Buffer size used to fetch a device's report descriptor.
    pub max_report_descriptor_len: usize,
}

impl Default for HidApiConfig {
    fn default() -> Self {
        Self {
            max_report_descriptor_len: 4096,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
