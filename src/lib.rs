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

//! Gpiofan - CPU fan control daemon for Linux
//!
//! Polls a thermal-zone temperature file and switches a fan wired to a
//! single GPIO line, with a hysteresis band so the fan does not chatter
//! around the threshold. The line is driven either through the GPIO
//! character device or through the legacy sysfs export interface.

pub mod config;
pub mod gpio;
pub mod hysteresis;
pub mod logger;
pub mod service;
pub mod thermal;

#[cfg(test)]
pub mod test_utils;
