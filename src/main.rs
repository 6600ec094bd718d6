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

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use gpiofan::{config, logger, service};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set by the signal handler, observed by the control loop between cycles.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn print_help() {
    eprintln!("gpiofan {} - GPIO fan control daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    gpiofan [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Config file (default {})", config::DEFAULT_CONFIG_PATH);
    eprintln!("        --logging       Append JSON events to the event log");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    GPIOFAN_CONFIG      Config file path (overridden by --config)");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut config_override: Option<PathBuf> = None;
    let mut logging_enabled = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("gpiofan {}", VERSION);
                return;
            }
            "--logging" => {
                logging_enabled = true;
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("gpiofan: --config requires a path argument");
                    process::exit(1);
                }
                config_override = Some(PathBuf::from(&args[i]));
            }
            arg => {
                eprintln!("gpiofan: unknown argument: {}", arg);
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if logging_enabled {
        logger::init_logging();
    }

    // GPIO and thermal sysfs access usually need elevated privileges; warn
    // early instead of failing with an opaque permission error mid-acquire.
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("gpiofan: warning: not running as root; GPIO and sensor access may be denied");
    }

    let config_path = config_override.unwrap_or_else(config::config_path);
    let cfg = match config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("gpiofan: fatal: {}", e);
            process::exit(1);
        }
    };

    logger::log_event(
        "startup",
        json!({ "version": VERSION, "config": config_path.display().to_string() }),
    );

    if let Err(e) = ctrlc::set_handler(|| SHUTDOWN.store(true, Ordering::SeqCst)) {
        eprintln!("gpiofan: warning: could not install signal handler: {}", e);
    }

    if let Err(e) = service::run(&cfg, &SHUTDOWN) {
        eprintln!("gpiofan: fatal: {:#}", e);
        logger::log_event("fatal", json!({ "error": format!("{:#}", e) }));
        process::exit(1);
    }
}
