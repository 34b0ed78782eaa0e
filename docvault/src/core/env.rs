// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use log::warn;
use regex::Regex;
use std::collections::BTreeMap;
use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

/// Source of environment variables.
pub trait GetEnv {
    /// Get the value of a variable.
    fn get(&self, key: &str) -> Result<String, VarError>;

    /// Get all variables.
    fn all(&self) -> BTreeMap<String, String>;
}

/// Reads the process environment.
#[derive(Default)]
pub struct StdEnvGetter {}

impl GetEnv for StdEnvGetter {
    fn get(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }

    fn all(&self) -> BTreeMap<String, String> {
        std::env::vars().collect()
    }
}

/// A helper class to read environment variables and keep a report of the used values.
pub struct Env<EnvGetter: GetEnv> {
    getter: EnvGetter,
    message: String,
}

impl<EnvGetter: GetEnv> Env<EnvGetter> {
    pub fn new(getter: EnvGetter) -> Env<EnvGetter> {
        Env {
            getter,
            message: String::new(),
        }
    }

    /// Get a value from the environment.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to get.
    /// * `default_value` - The default value to return if the key is not found or invalid.
    ///
    /// # Returns
    ///
    /// The value of the environment variable.
    pub fn get<T: FromStr + Display>(&mut self, key: &str, default_value: T) -> T {
        self.get_impl(key, default_value, false)
    }

    /// Get a value from the environment and mask it in the report.
    pub fn get_masked<T: FromStr + Display>(&mut self, key: &str, default_value: T) -> T {
        self.get_impl(key, default_value, true)
    }

    /// Get a value from the environment if it is set and valid.
    pub fn get_optional<T: FromStr + Display>(&mut self, key: &str) -> Option<T> {
        let value = self.getter.get(key).ok()?;
        match value.parse::<T>() {
            Ok(value) => {
                self.message.push_str(&format!("\t{} = {}\n", key, value));
                Some(value)
            }
            Err(_) => {
                warn!("Invalid value '{}' for {}: ignored", value, key);
                None
            }
        }
    }

    /// Find variables matching a pattern with one capture group.
    ///
    /// # Returns
    ///
    /// Values by the captured part of the key, e.g. `DV_ACCOUNT_(.*)_LOGIN` gives `{"1": "john"}`
    /// for `DV_ACCOUNT_1_LOGIN=john`.
    pub fn matches<T: FromStr + Display>(&mut self, pattern: &str) -> BTreeMap<String, T> {
        let mut matches = BTreeMap::new();
        let Ok(pattern) = Regex::new(pattern) else {
            warn!("Invalid pattern '{}' for environment variables", pattern);
            return matches;
        };

        for (key, _) in self.getter.all() {
            let Some(id) = pattern
                .captures(&key)
                .and_then(|captures| captures.get(1))
                .map(|id| id.as_str().to_string())
            else {
                continue;
            };

            if let Some(value) = self.get_optional(&key) {
                matches.insert(id, value);
            }
        }

        matches
    }

    /// Pretty printed report of the read variables.
    pub fn message(&self) -> &String {
        &self.message
    }

    fn get_impl<T: FromStr + Display>(&mut self, key: &str, default_value: T, masked: bool) -> T {
        let (value, additional) = match self.getter.get(key) {
            Ok(value) => match value.parse() {
                Ok(value) => (value, ""),
                Err(_) => {
                    warn!("Invalid value '{}' for {}: use default", value, key);
                    (default_value, "(invalid)")
                }
            },
            Err(_) => (default_value, "(default)"),
        };

        let printed = if masked {
            "*".repeat(value.to_string().len())
        } else {
            value.to_string()
        };
        self.message
            .push_str(&format!("\t{} = {} {}\n", key, printed, additional));
        value
    }
}
