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

use crate::config::Config;
use std::path::PathBuf;

/// A validated config with the reference thresholds used across the test
/// suite: fan on at 56.0, off at 55.5.
pub fn test_config() -> Config {
    Config {
        chip: "gpiochip1".to_string(),
        line: 78,
        consumer: "gpiofan".to_string(),
        fan_on_temp_c: 56.0,
        fan_off_temp_c: 55.5,
        poll_interval_ms: 1,
        sensor_path: PathBuf::from("/sys/class/thermal/thermal_zone2/temp"),
        backend: None,
    }
}
