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
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use serde_json::json;
use thiserror::Error;

use crate::config::{Backend, Config};
use crate::logger;

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Fixed wait after writing to `export` for the kernel to materialize the
/// per-pin directory. Not a readiness poll: if the directory still is not
/// there, the subsequent direction write fails and acquisition aborts.
const EXPORT_SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("could not open GPIO chip '{chip}': {source}")]
    Chip {
        chip: String,
        source: gpio_cdev::Error,
    },
    #[error("could not get GPIO line {line} on chip '{chip}': {source}")]
    Line {
        chip: String,
        line: u32,
        source: gpio_cdev::Error,
    },
    #[error("could not request GPIO line {line} on chip '{chip}' as output: {source}")]
    Request {
        chip: String,
        line: u32,
        source: gpio_cdev::Error,
    },
    #[error("could not export GPIO {line}: {source}")]
    Export { line: u32, source: io::Error },
    #[error("could not set direction of GPIO {line} to out: {source}")]
    Direction { line: u32, source: io::Error },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not set GPIO line value: {0}")]
    Cdev(#[from] gpio_cdev::Error),
    #[error("could not write GPIO value file {path}: {source}")]
    Sysfs { path: PathBuf, source: io::Error },
}

/// Exclusive ownership of the fan line for the process lifetime.
///
/// `set` failures are non-fatal; the control loop logs them and retries the
/// transition on its next cycle. `release` drives the line low and hands it
/// back to the kernel; it is idempotent, logs its own failures, and is also
/// invoked from `Drop` so the fan cannot be left running on any exit path.
pub trait Actuator {
    fn set(&mut self, on: bool) -> Result<(), WriteError>;
    fn release(&mut self);
}

/// Acquire the fan line with the backend from the config, or by probing for
/// the character device when the config leaves the choice open.
pub fn acquire(cfg: &Config) -> Result<Box<dyn Actuator>, AcquireError> {
    match selected_backend(cfg) {
        Backend::Cdev => Ok(Box::new(CdevActuator::acquire(cfg)?)),
        Backend::Sysfs => Ok(Box::new(SysfsActuator::acquire(cfg)?)),
    }
}

fn selected_backend(cfg: &Config) -> Backend {
    cfg.backend.unwrap_or_else(|| {
        if Path::new("/dev").join(&cfg.chip).exists() {
            Backend::Cdev
        } else {
            Backend::Sysfs
        }
    })
}

/// Drives the fan through a GPIO character device line request.
pub struct CdevActuator {
    handle: Option<LineHandle>,
    chip: String,
    line: u32,
}

impl CdevActuator {
    pub fn acquire(cfg: &Config) -> Result<Self, AcquireError> {
        let dev = Path::new("/dev").join(&cfg.chip);
        let mut chip = Chip::new(&dev).map_err(|e| AcquireError::Chip {
            chip: cfg.chip.clone(),
            source: e,
        })?;
        let line = chip.get_line(cfg.line).map_err(|e| AcquireError::Line {
            chip: cfg.chip.clone(),
            line: cfg.line,
            source: e,
        })?;
        let handle = line
            .request(LineRequestFlags::OUTPUT, 0, &cfg.consumer)
            .map_err(|e| AcquireError::Request {
                chip: cfg.chip.clone(),
                line: cfg.line,
                source: e,
            })?;
        logger::log_event(
            "gpio_acquire",
            json!({ "backend": "cdev", "chip": cfg.chip, "line": cfg.line }),
        );
        Ok(Self {
            handle: Some(handle),
            chip: cfg.chip.clone(),
            line: cfg.line,
        })
    }
}

impl Actuator for CdevActuator {
    fn set(&mut self, on: bool) -> Result<(), WriteError> {
        match &self.handle {
            Some(handle) => Ok(handle.set_value(if on { 1 } else { 0 })?),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.set_value(0) {
                eprintln!(
                    "gpiofan: could not drive line {} on '{}' low before release: {}",
                    self.line, self.chip, e
                );
            }
            logger::log_event(
                "gpio_release",
                json!({ "backend": "cdev", "chip": self.chip, "line": self.line }),
            );
            // Dropping the handle returns the line to the kernel.
        }
    }
}

impl Drop for CdevActuator {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drives the fan through the legacy sysfs export/direction/value files.
#[derive(Debug)]
pub struct SysfsActuator {
    base: PathBuf,
    line: u32,
    value_path: PathBuf,
    exported: bool,
}

impl SysfsActuator {
    pub fn acquire(cfg: &Config) -> Result<Self, AcquireError> {
        Self::acquire_at(Path::new(SYSFS_GPIO_ROOT), cfg.line)
    }

    /// Export the pin under `base` and configure it as an output. The base
    /// path is injectable so the whole lifecycle can run against a plain
    /// directory in tests.
    pub fn acquire_at(base: &Path, line: u32) -> Result<Self, AcquireError> {
        fs::write(base.join("export"), line.to_string())
            .map_err(|e| AcquireError::Export { line, source: e })?;

        thread::sleep(EXPORT_SETTLE_DELAY);

        let pin_dir = base.join(format!("gpio{}", line));
        if let Err(e) = fs::write(pin_dir.join("direction"), "out") {
            // The pin was already exported; hand it back before bailing out.
            let _ = fs::write(base.join("unexport"), line.to_string());
            return Err(AcquireError::Direction { line, source: e });
        }
        logger::log_event("gpio_acquire", json!({ "backend": "sysfs", "line": line }));
        Ok(Self {
            base: base.to_path_buf(),
            line,
            value_path: pin_dir.join("value"),
            exported: true,
        })
    }
}

impl Actuator for SysfsActuator {
    fn set(&mut self, on: bool) -> Result<(), WriteError> {
        fs::write(&self.value_path, if on { "1" } else { "0" }).map_err(|e| WriteError::Sysfs {
            path: self.value_path.clone(),
            source: e,
        })
    }

    fn release(&mut self) {
        if !self.exported {
            return;
        }
        self.exported = false;
        if let Err(e) = fs::write(&self.value_path, "0") {
            eprintln!(
                "gpiofan: could not drive GPIO {} low before unexport: {}",
                self.line, e
            );
        }
        if let Err(e) = fs::write(self.base.join("unexport"), self.line.to_string()) {
            eprintln!("gpiofan: could not unexport GPIO {}: {}", self.line, e);
        }
        logger::log_event(
            "gpio_release",
            json!({ "backend": "sysfs", "line": self.line }),
        );
    }
}

impl Drop for SysfsActuator {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;
    use tempfile::TempDir;

    /// A fake sysfs gpio class directory: `export`/`unexport` control files
    /// plus, optionally, the per-pin directory the kernel would create.
    fn fake_sysfs(line: Option<u32>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        if let Some(n) = line {
            let pin_dir = dir.path().join(format!("gpio{}", n));
            fs::create_dir(&pin_dir).unwrap();
            fs::write(pin_dir.join("direction"), "in").unwrap();
            fs::write(pin_dir.join("value"), "0").unwrap();
        }
        dir
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    #[test]
    fn test_sysfs_acquire_exports_and_sets_direction() {
        let dir = fake_sysfs(Some(78));
        let _actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
        assert_eq!(read(&dir, "export"), "78");
        assert_eq!(read(&dir, "gpio78/direction"), "out");
    }

    #[test]
    fn test_sysfs_set_writes_value_file() {
        let dir = fake_sysfs(Some(78));
        let mut actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
        actuator.set(true).unwrap();
        assert_eq!(read(&dir, "gpio78/value"), "1");
        actuator.set(false).unwrap();
        assert_eq!(read(&dir, "gpio78/value"), "0");
    }

    #[test]
    fn test_sysfs_release_drives_low_and_unexports() {
        let dir = fake_sysfs(Some(78));
        let mut actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
        actuator.set(true).unwrap();
        actuator.release();
        assert_eq!(read(&dir, "gpio78/value"), "0");
        assert_eq!(read(&dir, "unexport"), "78");
    }

    #[test]
    fn test_sysfs_release_is_idempotent() {
        let dir = fake_sysfs(Some(78));
        let mut actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
        actuator.release();
        // A second release must not touch the control files again.
        fs::write(dir.path().join("unexport"), "sentinel").unwrap();
        fs::write(dir.path().join("gpio78/value"), "sentinel").unwrap();
        actuator.release();
        assert_eq!(read(&dir, "unexport"), "sentinel");
        assert_eq!(read(&dir, "gpio78/value"), "sentinel");
    }

    #[test]
    fn test_sysfs_drop_releases() {
        let dir = fake_sysfs(Some(78));
        {
            let mut actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
            actuator.set(true).unwrap();
        }
        assert_eq!(read(&dir, "gpio78/value"), "0");
        assert_eq!(read(&dir, "unexport"), "78");
    }

    #[test]
    fn test_sysfs_missing_pin_dir_fails_acquire_and_unexports() {
        // The kernel never materialized gpio78/, so the direction write
        // fails and the export must be rolled back.
        let dir = fake_sysfs(None);
        let err = SysfsActuator::acquire_at(dir.path(), 78).unwrap_err();
        assert!(matches!(err, AcquireError::Direction { line: 78, .. }));
        assert_eq!(read(&dir, "unexport"), "78");
    }

    #[test]
    fn test_sysfs_write_error_reports_value_path() {
        let dir = fake_sysfs(Some(78));
        let mut actuator = SysfsActuator::acquire_at(dir.path(), 78).unwrap();
        fs::remove_dir_all(dir.path().join("gpio78")).unwrap();
        let err = actuator.set(true).unwrap_err();
        assert!(matches!(err, WriteError::Sysfs { .. }));
    }

    #[test]
    fn test_backend_selection_honors_config() {
        let mut cfg = test_config();
        cfg.backend = Some(Backend::Sysfs);
        assert_eq!(selected_backend(&cfg), Backend::Sysfs);
        cfg.backend = Some(Backend::Cdev);
        assert_eq!(selected_backend(&cfg), Backend::Cdev);
    }

    #[test]
    fn test_backend_probe_falls_back_to_sysfs() {
        let mut cfg = test_config();
        cfg.backend = None;
        cfg.chip = "gpiochip-that-does-not-exist".to_string();
        assert_eq!(selected_backend(&cfg), Backend::Sysfs);
    }
}
