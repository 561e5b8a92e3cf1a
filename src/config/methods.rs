//! Loading and overriding `RankConfig`
//!
//! Precedence, lowest first: built-in defaults, JSON file, `PLACERANK_*`
//! environment variables, CLI flags (applied by the binary through the
//! builder).

use std::path::Path;

use super::builder::RankConfigBuilder;
use super::types::RankConfig;
use crate::error::{RankError, RankResult};

/// Comma-separated proxy list
pub const ENV_PROXIES: &str = "PLACERANK_PROXIES";
pub const ENV_USE_PROXY: &str = "PLACERANK_USE_PROXY";
pub const ENV_HEADLESS: &str = "PLACERANK_HEADLESS";

impl RankConfig {
    /// Parse and validate a config from JSON text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or when validation fails.
    pub fn from_json_str(json: &str) -> RankResult<Self> {
        let raw: RankConfig = serde_json::from_str(json)
            .map_err(|e| RankError::config(format!("Invalid config JSON: {e}")))?;
        RankConfigBuilder::from_config(raw).build()
    }

    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or its content is invalid.
    pub async fn from_json_file(path: impl AsRef<Path>) -> RankResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            RankError::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Apply `PLACERANK_*` overrides and re-validate.
    ///
    /// # Errors
    ///
    /// Returns an error when a boolean variable can't be parsed or the
    /// resulting config fails validation.
    pub fn with_env_overrides(self) -> RankResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Split out for tests.
    pub(crate) fn with_overrides_from<F>(mut self, lookup: F) -> RankResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup(ENV_PROXIES) {
            self.proxy_list = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup(ENV_USE_PROXY) {
            self.use_proxy = parse_bool(ENV_USE_PROXY, &v)?;
        }
        if let Some(v) = lookup(ENV_HEADLESS) {
            self.headless = parse_bool(ENV_HEADLESS, &v)?;
        }
        RankConfigBuilder::from_config(self).build()
    }

    /// Pretty JSON rendering, used to dump the effective config
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> RankResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_bool(key: &str, value: &str) -> RankResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RankError::config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
