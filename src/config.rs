//! Process-wide git transport settings.
//!
//! Loaded once (usually from the environment) and handed to each session as
//! a read-only value:
//! - `GITGET_SSL_VERIFY`: passed to git as `http.sslVerify` (default `true`)
//! - `GITGET_PROXY`: passed to git as `http.proxy` (default empty, no proxy)
//! - `GITGET_TIMEOUT`: per-subcommand timeout in seconds (default 120)

use std::time::Duration;

use crate::error::{GitgetError, Result};

pub const SSL_VERIFY_VAR: &str = "GITGET_SSL_VERIFY";
pub const PROXY_VAR: &str = "GITGET_PROXY";
pub const TIMEOUT_VAR: &str = "GITGET_TIMEOUT";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitgetConfig {
    /// Verify TLS certificates for http(s) remotes.
    pub ssl_verify: bool,
    /// Proxy URL for http(s) remotes; empty disables the proxy.
    pub proxy: String,
    /// Upper bound for every single git invocation.
    pub timeout: Duration,
}

impl Default for GitgetConfig {
    fn default() -> Self {
        Self {
            ssl_verify: true,
            proxy: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GitgetConfig {
    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(SSL_VERIFY_VAR) {
            config.ssl_verify = parse_bool(&value).ok_or_else(|| {
                GitgetError::Config(format!("{SSL_VERIFY_VAR} must be a boolean, got {value:?}"))
            })?;
        }

        if let Some(value) = lookup(PROXY_VAR) {
            config.proxy = value.trim().to_owned();
        }

        if let Some(value) = lookup(TIMEOUT_VAR) {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    GitgetError::Config(format!(
                        "{TIMEOUT_VAR} must be a positive number of seconds, got {value:?}"
                    ))
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
