//! Application configuration parsed from environment variables.
//!
//! Parsing runs over a lookup function so tests never touch the process
//! environment; [`AppConfig::from_env`] plugs in `std::env::var`.

use std::time::Duration;

use crate::bootstrap::{BootstrapConfig, DEFAULT_SESSION_TIMEOUT_MS, DemotionPolicy};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where sessions and profiles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Postgres { database_url: String, session_token: Option<String> },
    Rest { url: String, anon_key: String, access_token: Option<String>, http_timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: Backend,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// - `AUTH_BACKEND`: `postgres` (default) or `rest`
    /// - `DATABASE_URL`, `SESSION_TOKEN`: postgres backend
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_ACCESS_TOKEN`: rest backend
    /// - `HTTP_TIMEOUT_SECS`: default 10
    /// - `SESSION_CHECK_TIMEOUT_MS`: default 4000
    /// - `DEMOTION_POLICY`: `always` (default) or `initial_only`
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("AUTH_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => Backend::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                session_token: get("SESSION_TOKEN"),
            },
            "rest" => Backend::Rest {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
                access_token: get("SUPABASE_ACCESS_TOKEN"),
                http_timeout: Duration::from_secs(parse_u64(
                    "HTTP_TIMEOUT_SECS",
                    get("HTTP_TIMEOUT_SECS"),
                    DEFAULT_HTTP_TIMEOUT_SECS,
                )?),
            },
            other => return Err(ConfigError::Invalid { key: "AUTH_BACKEND", value: other.to_owned() }),
        };

        let timeout_ms = parse_u64("SESSION_CHECK_TIMEOUT_MS", get("SESSION_CHECK_TIMEOUT_MS"), DEFAULT_SESSION_TIMEOUT_MS)?;
        let demotion = parse_demotion(get("DEMOTION_POLICY").as_deref())?;

        Ok(Self {
            backend,
            bootstrap: BootstrapConfig { session_timeout: Duration::from_millis(timeout_ms), demotion },
        })
    }
}

fn parse_u64(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_demotion(raw: Option<&str>) -> Result<DemotionPolicy, ConfigError> {
    match raw.unwrap_or("always") {
        "always" => Ok(DemotionPolicy::Always),
        "initial_only" => Ok(DemotionPolicy::InitialOnly),
        other => Err(ConfigError::Invalid { key: "DEMOTION_POLICY", value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
