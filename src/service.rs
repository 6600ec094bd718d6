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

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Config;
use crate::gpio::{self, Actuator};
use crate::hysteresis::{self, FanState};
use crate::logger;
use crate::thermal::{TempSource, ThermalZone};

/// The loop sleeps in short slices so a termination signal is honored at
/// the next slice boundary instead of a full poll interval later.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

pub fn run(cfg: &Config, shutdown: &AtomicBool) -> Result<()> {
    eprintln!(
        "gpiofan: fan on at {}\u{b0}C, off at {}\u{b0}C, polling every {}ms",
        cfg.fan_on_temp_c, cfg.fan_off_temp_c, cfg.poll_interval_ms
    );

    let sensor = ThermalZone::new(cfg.sensor_path.clone());
    let mut actuator = gpio::acquire(cfg).context("could not acquire the fan GPIO line")?;
    logger::log_event(
        "service_start",
        json!({
            "chip": cfg.chip,
            "line": cfg.line,
            "fan_on_temp_c": cfg.fan_on_temp_c,
            "fan_off_temp_c": cfg.fan_off_temp_c,
            "poll_interval_ms": cfg.poll_interval_ms,
        }),
    );

    run_loop(cfg, &sensor, actuator.as_mut(), shutdown);

    logger::log_event("service_stop", json!({}));
    eprintln!("gpiofan: shut down cleanly");
    Ok(())
}

fn run_loop(
    cfg: &Config,
    sensor: &dyn TempSource,
    actuator: &mut dyn Actuator,
    shutdown: &AtomicBool,
) {
    let mut state = FanState::Off;

    // The line was requested low, but make the hardware agree with the
    // in-memory state even if a previous owner left the pin high.
    if let Err(e) = actuator.set(false) {
        eprintln!("gpiofan: could not drive the fan low at startup: {}", e);
        logger::log_event("gpio_write_error", json!({ "error": e.to_string() }));
    }

    let interval = cfg.poll_interval();
    let slice = SLEEP_SLICE.min(interval);
    let mut next_due = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        if Instant::now() < next_due {
            thread::sleep(slice);
            continue;
        }
        next_due = Instant::now() + interval;

        let temp_c = match sensor.read_temp() {
            Ok(t) => t,
            Err(e) => {
                // Transient: skip this cycle rather than guess at a stale
                // temperature; no controller evaluation, no actuation.
                eprintln!("gpiofan: temperature read failed: {}", e);
                logger::log_event("temp_read_error", json!({ "error": e.to_string() }));
                continue;
            }
        };

        let next = hysteresis::next_state(state, temp_c, cfg);
        if next == state {
            continue;
        }
        match actuator.set(next == FanState::On) {
            Ok(()) => {
                logger::log_event(
                    "fan_transition",
                    json!({ "temp_c": temp_c, "fan": next.as_str() }),
                );
                state = next;
            }
            Err(e) => {
                // State is left as-is so the same transition is decided and
                // retried on the next cycle.
                eprintln!("gpiofan: could not switch fan {}: {}", next.as_str(), e);
                logger::log_event(
                    "gpio_write_error",
                    json!({ "error": e.to_string(), "wanted": next.as_str() }),
                );
            }
        }
    }

    // The fan must never be left running past the loop.
    if let Err(e) = actuator.set(false) {
        eprintln!("gpiofan: could not drive the fan low during shutdown: {}", e);
        logger::log_event("gpio_write_error", json!({ "error": e.to_string() }));
    }
    actuator.release();
}
