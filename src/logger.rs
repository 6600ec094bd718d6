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

//! Append-only JSON-lines event log, enabled with `--logging`.
//!
//! Until `init_logging` succeeds every `log_event` call is a no-op, so the
//! rest of the code logs unconditionally without caring whether the operator
//! asked for an event trail.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const SYSTEM_LOG_PATH: &str = "/var/log/gpiofan/events.json";
const FALLBACK_LOG_PATH: &str = "/tmp/gpiofan_events.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn open_append(path: &str) -> Option<File> {
    if let Some(parent) = Path::new(path).parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

pub fn init_logging() {
    let file = open_append(SYSTEM_LOG_PATH).or_else(|| open_append(FALLBACK_LOG_PATH));
    if file.is_none() {
        eprintln!("gpiofan: warning: could not open an event log file; --logging disabled");
    }
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = file;
    }
}

pub fn log_event(event: &str, data: Value) {
    let Ok(mut guard) = LOG_FILE.lock() else {
        return;
    };
    if let Some(f) = guard.as_mut() {
        let line = json!({
            "ts_ms": now_millis(),
            "event": event,
            "data": data,
        })
        .to_string();
        let _ = writeln!(f, "{}", line);
    }
}
