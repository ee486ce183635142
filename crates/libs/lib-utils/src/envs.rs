//! # Environment Variables
//!
//! Reading and parsing environment variables, with or without a fallback.
//!
//! Empty values are treated the same as unset ones, so a `.env` line like
//! `WALLET_BATCH_DELAY_MS=` falls back to the default instead of failing to parse.

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Get an environment variable, `None` when unset or blank.
pub fn get_env_opt(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable or a default value.
pub fn get_env_or(name: &'static str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
///
/// A value that is present but malformed is still an error.
pub fn get_env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match get_env_opt(name) {
        Some(val) => val.parse::<T>().map_err(|_| Error::WrongFormat { name, value: val }),
        None => Ok(default),
    }
}

// region:    --- Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{name} has an invalid value: {value:?}")]
    WrongFormat { name: &'static str, value: String },
}
// endregion: --- Error
