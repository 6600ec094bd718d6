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

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Readings outside this window are treated as sensor glitches, not as real
/// CPU temperatures.
const PLAUSIBLE_MIN_C: f64 = -50.0;
const PLAUSIBLE_MAX_C: f64 = 200.0;

#[derive(Debug, Error)]
pub enum TempReadError {
    #[error("could not open temperature file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("temperature file {path} is empty")]
    Empty { path: PathBuf },
    #[error("could not parse temperature value '{value}' from {path}")]
    Parse { path: PathBuf, value: String },
    #[error("temperature {celsius}\u{b0}C from {path} is outside the plausible range")]
    OutOfRange { path: PathBuf, celsius: f64 },
}

/// Anything that can produce a current temperature in Celsius. Every call
/// performs a fresh read; there is no caching layer.
#[cfg_attr(test, mockall::automock)]
pub trait TempSource {
    fn read_temp(&self) -> Result<f64, TempReadError>;
}

/// Reads a kernel thermal-zone style file: a single integer in millidegrees
/// Celsius, e.g. `45500` for 45.5 degrees.
pub struct ThermalZone {
    path: PathBuf,
}

impl ThermalZone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TempSource for ThermalZone {
    fn read_temp(&self) -> Result<f64, TempReadError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| TempReadError::Open {
            path: self.path.clone(),
            source: e,
        })?;
        let value = raw.trim();
        if value.is_empty() {
            return Err(TempReadError::Empty {
                path: self.path.clone(),
            });
        }
        let millidegrees: i64 = value.parse().map_err(|_| TempReadError::Parse {
            path: self.path.clone(),
            value: value.to_string(),
        })?;
        let celsius = millidegrees as f64 / 1000.0;
        if !(PLAUSIBLE_MIN_C..=PLAUSIBLE_MAX_C).contains(&celsius) {
            return Err(TempReadError::OutOfRange {
                path: self.path.clone(),
                celsius,
            });
        }
        Ok(celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn zone_with(contents: &str) -> (NamedTempFile, ThermalZone) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        let zone = ThermalZone::new(file.path());
        (file, zone)
    }

    #[test]
    fn test_read_millidegrees() {
        let (_file, zone) = zone_with("45500\n");
        assert_eq!(zone.read_temp().unwrap(), 45.5);
    }

    #[test]
    fn test_read_trims_whitespace() {
        let (_file, zone) = zone_with("  56000 \n");
        assert_eq!(zone.read_temp().unwrap(), 56.0);
    }

    #[test]
    fn test_read_negative_temperature() {
        let (_file, zone) = zone_with("-5000\n");
        assert_eq!(zone.read_temp().unwrap(), -5.0);
    }

    #[test]
    fn test_read_zero() {
        let (_file, zone) = zone_with("0\n");
        assert_eq!(zone.read_temp().unwrap(), 0.0);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let (_file, zone) = zone_with("");
        assert!(matches!(
            zone.read_temp(),
            Err(TempReadError::Empty { .. })
        ));
    }

    #[test]
    fn test_whitespace_only_file_is_an_error() {
        let (_file, zone) = zone_with("\n");
        assert!(matches!(
            zone.read_temp(),
            Err(TempReadError::Empty { .. })
        ));
    }

    #[test]
    fn test_non_numeric_value_is_an_error() {
        let (_file, zone) = zone_with("not-a-temp\n");
        assert!(matches!(
            zone.read_temp(),
            Err(TempReadError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let zone = ThermalZone::new("/nonexistent/thermal_zone9/temp");
        assert!(matches!(zone.read_temp(), Err(TempReadError::Open { .. })));
    }

    #[test]
    fn test_implausibly_hot_reading_is_an_error() {
        let (_file, zone) = zone_with("300000\n");
        assert!(matches!(
            zone.read_temp(),
            Err(TempReadError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_implausibly_cold_reading_is_an_error() {
        let (_file, zone) = zone_with("-60000\n");
        assert!(matches!(
            zone.read_temp(),
            Err(TempReadError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_boundary_readings_are_accepted() {
        let (_file, zone) = zone_with("200000\n");
        assert_eq!(zone.read_temp().unwrap(), 200.0);
        let (_file, zone) = zone_with("-50000\n");
        assert_eq!(zone.read_temp().unwrap(), -50.0);
    }
}
