use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::history::{DEFAULT_HISTORY_LEN, MAX_HISTORY_LEN};

pub const DEFAULT_FLUSH_INTERVAL_MS: f64 = 1000.0;
pub const DEFAULT_PRELOAD_DELAY_MS: u32 = 2000;

pub const ENV_SHOW_DEBUG: &str = "STUDYHALL_SHOW_DEBUG";
pub const ENV_ADAPTIVE_QUALITY: &str = "STUDYHALL_ADAPTIVE_QUALITY";
pub const ENV_HISTORY_LEN: &str = "STUDYHALL_HISTORY_LEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[cfg(feature = "serde")]
    #[error("invalid monitor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Caller-supplied monitor settings. Nothing here is persisted by the core.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Render the visible overlay. Sampling runs either way.
    #[cfg_attr(feature = "serde", serde(default))]
    pub show_debug: bool,
    /// Publish quality-change signals on poor/excellent tiers.
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub adaptive_quality: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_history_len"))]
    pub history_len: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_flush_interval_ms"))]
    pub flush_interval_ms: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_preload_delay_ms"))]
    pub preload_delay_ms: u32,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_history_len() -> usize {
    DEFAULT_HISTORY_LEN
}

#[cfg(feature = "serde")]
fn default_flush_interval_ms() -> f64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

#[cfg(feature = "serde")]
fn default_preload_delay_ms() -> u32 {
    DEFAULT_PRELOAD_DELAY_MS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            show_debug: false,
            adaptive_quality: true,
            history_len: DEFAULT_HISTORY_LEN,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            preload_delay_ms: DEFAULT_PRELOAD_DELAY_MS,
        }
    }
}

impl MonitorConfig {
    #[cfg(feature = "serde")]
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        Ok(cfg.normalized())
    }

    /// Clamp values into usable ranges.
    pub fn normalized(mut self) -> Self {
        self.history_len = self.history_len.clamp(1, MAX_HISTORY_LEN);
        if !self.flush_interval_ms.is_finite() || self.flush_interval_ms <= 0.0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        self
    }

    /// Apply `STUDYHALL_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_SHOW_DEBUG) {
            self.show_debug = parse_flag(ENV_SHOW_DEBUG, &v)?;
        }
        if let Some(v) = lookup(ENV_ADAPTIVE_QUALITY) {
            self.adaptive_quality = parse_flag(ENV_ADAPTIVE_QUALITY, &v)?;
        }
        if let Some(v) = lookup(ENV_HISTORY_LEN) {
            self.history_len = v
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_HISTORY_LEN,
                    value: v.clone(),
                })?;
        }
        Ok(self.normalized())
    }
}

fn parse_flag(key: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: v.to_string(),
        }),
    }
}
