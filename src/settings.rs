// src/settings.rs
//
// TOML configuration: which serial device to open and which sensors to track.
//
//   device = "/dev/ttyUSB0"
//
//   [devices.55]
//   name = "Front door"
//   device_class = "door"
//   off_delay = 5
//
//   [devices.a1]
//   name = "Hall motion"
//   kind = "x10"

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, W800Error};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Serial device path (e.g. /dev/ttyUSB0 or COM3)
    #[serde(default)]
    pub device: Option<String>,
    /// Sensors keyed by address: two hex digits for security sensors, "a1" style for X10
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub device_class: Option<String>,
    /// Seconds after an "on" report before the sensor turns itself off
    #[serde(default)]
    pub off_delay: Option<u64>,
    /// Forces how the address key is read; needed for keys like "a1" that are valid both ways
    #[serde(default)]
    pub kind: Option<SensorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    X10,
    Security,
}

/// `<config dir>/w800rf32/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("w800rf32").join("config.toml"))
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            W800Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml_str(&content)?;
        tlog!(
            "[settings] Loaded {} ({} sensors)",
            path.display(),
            settings.devices.len()
        );
        Ok(settings)
    }

    /// Load an explicit config file, or the default one if it exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// The device to open: the command-line override wins over the config file.
    pub fn device_path(&self, override_path: Option<&str>) -> Result<String> {
        override_path
            .map(str::to_string)
            .or_else(|| self.device.clone())
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                W800Error::Config("no serial device configured (set `device` or pass --device)".to_string())
            })
    }
}
