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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    Off,
    On,
}

impl FanState {
    pub fn as_str(self) -> &'static str {
        match self {
            FanState::Off => "off",
            FanState::On => "on",
        }
    }
}

/// Two-state Schmitt trigger over the fan thresholds.
///
/// The fan turns on at or above `fan_on_temp_c` and off at or below
/// `fan_off_temp_c`; inside the dead band between the two the current state
/// is held, so sensor noise around a single threshold cannot make the fan
/// chatter. Comparisons are inclusive on both sides.
pub fn next_state(current: FanState, temp_c: f64, cfg: &Config) -> FanState {
    match current {
        FanState::Off if temp_c >= cfg.fan_on_temp_c => FanState::On,
        FanState::On if temp_c <= cfg.fan_off_temp_c => FanState::Off,
        _ => current,
    }
}
