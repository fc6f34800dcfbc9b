//! Environment-variable helpers used by service `from_env` constructors.

use std::str::FromStr;

use anyhow::{Context as _, anyhow};

/// Read a required variable. Empty values count as missing.
pub fn require_env(key: &str) -> anyhow::Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(anyhow!("missing required environment variable {key}")),
    }
}

/// Read an optional variable. Empty values count as unset.
pub fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than a silent fallback.
pub fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
