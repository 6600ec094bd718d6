/*
 * This file is part of Gpiofan.
 *
 * Copyright (C) 2026 Gpiofan contributors
 *
 * Gpiofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Gpiofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Gpiofan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/gpiofan/config.json";

/// One day; a longer poll interval is a typo, not a cooling policy.
const MAX_POLL_INTERVAL_MS: u64 = 86_400_000;

/// Which kernel interface drives the fan line. When absent from the config
/// the backend is probed at startup: the character device wins if present.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Cdev,
    Sysfs,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One run's worth of parameters, validated once at load time and passed by
/// reference everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GPIO controller name, e.g. "gpiochip1".
    pub chip: String,
    /// Line offset of the fan pin on that controller.
    pub line: u32,
    #[serde(default = "default_consumer")]
    pub consumer: String,
    /// Fan switches on at or above this temperature.
    pub fan_on_temp_c: f64,
    /// Fan switches off at or below this temperature. Must be strictly
    /// below `fan_on_temp_c` so the dead band is non-empty.
    pub fan_off_temp_c: f64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// File holding the CPU temperature in millidegrees Celsius.
    pub sensor_path: PathBuf,
    #[serde(default)]
    pub backend: Option<Backend>,
}

fn default_consumer() -> String {
    "gpiofan".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chip.is_empty() || self.chip.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "chip must be a bare controller name, got '{}'",
                self.chip
            )));
        }
        if !is_safe_label(&self.consumer) {
            return Err(ConfigError::Invalid(format!(
                "consumer label '{}' contains invalid characters or length",
                self.consumer
            )));
        }
        if !self.fan_on_temp_c.is_finite() || !self.fan_off_temp_c.is_finite() {
            return Err(ConfigError::Invalid(
                "temperature thresholds must be finite".to_string(),
            ));
        }
        if self.fan_on_temp_c <= self.fan_off_temp_c {
            return Err(ConfigError::Invalid(format!(
                "fan_on_temp_c ({}) must be greater than fan_off_temp_c ({})",
                self.fan_on_temp_c, self.fan_off_temp_c
            )));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_ms must be between 1 and {}",
                MAX_POLL_INTERVAL_MS
            )));
        }
        if self.sensor_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("sensor_path must be set".to_string()));
        }
        Ok(())
    }
}

fn is_safe_label(s: &str) -> bool {
    if s.is_empty() || s.len() > 128 {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-' | '.' | ' ' | '@'))
}

pub fn config_path() -> PathBuf {
    if let Ok(p) = env::var("GPIOFAN_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let cfg: Config = serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    cfg.validate()?;
    Ok(cfg)
}
