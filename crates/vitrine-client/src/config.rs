//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so the engine runs with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use vitrine_shared::constants::{
    DEFAULT_AUTOSAVE_DEBOUNCE_MS, DEFAULT_FETCH_RETRIES, DEFAULT_RETRY_BACKOFF_MS,
    MAX_RETRY_BACKOFF_MS,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period after the last edit before an autosave is sent.
    /// Env: `VITRINE_AUTOSAVE_DEBOUNCE_MS`
    /// Default: 800 ms
    pub autosave_debounce: Duration,

    /// Retries of a failed surface fetch before the error is shown.
    /// Env: `VITRINE_FETCH_RETRIES`
    /// Default: 3
    pub fetch_retries: u32,

    /// Delay before the first retry; doubles with each further retry.
    /// Env: `VITRINE_RETRY_BACKOFF_MS`
    /// Default: 250 ms
    pub retry_backoff: Duration,

    /// Cap on a single retry delay.
    pub max_retry_backoff: Duration,

    /// SQLite database file.
    /// Env: `VITRINE_DB_PATH`
    /// Default: platform data directory.
    pub database_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
            fetch_retries: DEFAULT_FETCH_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            max_retry_backoff: Duration::from_millis(MAX_RETRY_BACKOFF_MS),
            database_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "VITRINE_AUTOSAVE_DEBOUNCE_MS") {
            config.autosave_debounce = Duration::from_millis(ms);
        }

        if let Some(n) = parse_var::<u32>(&lookup, "VITRINE_FETCH_RETRIES") {
            config.fetch_retries = n;
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "VITRINE_RETRY_BACKOFF_MS") {
            config.retry_backoff = Duration::from_millis(ms);
        }

        if let Some(path) = lookup("VITRINE_DB_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.retry_backoff
            .saturating_mul(factor)
            .min(self.max_retry_backoff)
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(variable = key, value = %raw, "Invalid value, using default");
            None
        }
    }
}
