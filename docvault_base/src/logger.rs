// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::prelude::{DateTime, Utc};
use log::{warn, Level, Log, Metadata, Record};
use std::collections::BTreeMap;
use std::sync::{LazyLock, RwLock};

static LOGGER: Logger = Logger;

/// Levels by module path, the empty path is the root level.
static PATHS: LazyLock<RwLock<BTreeMap<String, Level>>> =
    LazyLock::new(|| RwLock::new(BTreeMap::new()));

/// Line logger with per-module levels, e.g. `INFO,docvault::api=DEBUG`.
pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let Ok(paths) = PATHS.read() else {
            return false;
        };

        let target = metadata.target().replace("::", "/");
        // the longest matching path wins, BTreeMap keeps them sorted so reverse order is enough
        paths
            .iter()
            .rev()
            .find(|(path, _)| path.is_empty() || target.starts_with(path.as_str()))
            .map_or(false, |(_, level)| metadata.level() <= *level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now: DateTime<Utc> = Utc::now();
        let file = match record.file() {
            // strip the registry or workspace prefix
            Some(file) => file.split_once("src/").map_or(file, |(_, file)| file),
            None => "(unknown)",
        };

        let package_name = record
            .target()
            .split_once(':')
            .map_or(record.target(), |(package, _)| package);

        println!(
            "{} ({:>5}) [{}] -- {}/{}:{} {}",
            now.format("%Y-%m-%d %H:%M:%S.%3f"),
            thread_id::get() % 100000,
            record.level(),
            package_name,
            file,
            record.line().unwrap_or(0),
            record.args(),
        );
    }

    fn flush(&self) {}
}

impl Logger {
    /// Initialize the logger.
    ///
    /// # Arguments
    ///
    /// * `levels` - Comma separated list of levels. An entry without a path sets the root level,
    ///   `path=LEVEL` sets the level for a module path (`docvault::api` or `docvault/api`).
    ///   Levels are TRACE, DEBUG, INFO, WARN, ERROR.
    pub fn init(levels: &str) {
        let (parsed, invalid) = parse_levels(levels);
        let max_level = parsed.values().max().copied().unwrap_or(Level::Info);

        if let Ok(mut paths) = PATHS.write() {
            *paths = parsed;
        }

        log::set_logger(&LOGGER).ok();
        log::set_max_level(max_level.to_level_filter());

        for level in invalid {
            warn!("Invalid log level: {}, defaulting to INFO", level);
        }
    }
}

fn parse_levels(levels: &str) -> (BTreeMap<String, Level>, Vec<String>) {
    let mut paths = BTreeMap::from([(String::new(), Level::Info)]);
    let mut invalid = Vec::new();

    for item in levels.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (path, level) = match item.split_once('=') {
            Some((path, level)) => (path.trim().replace("::", "/"), level.trim()),
            None => (String::new(), item),
        };

        let level = match level.to_uppercase().as_str() {
            "TRACE" => Level::Trace,
            "DEBUG" => Level::Debug,
            "INFO" => Level::Info,
            "WARN" => Level::Warn,
            "ERROR" => Level::Error,
            _ => {
                invalid.push(level.to_string());
                Level::Info
            }
        };

        paths.insert(path, level);
    }

    (paths, invalid)
}
