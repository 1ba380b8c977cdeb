//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against the public demo API.

use std::time::Duration;

use causerie_shared::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_PAGE_TRIGGER_THRESHOLD, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use causerie_shared::CauserieError;

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the chat API.
    /// Env: `CAUSERIE_API_URL`
    /// Default: `https://dummy-chat-server.tribechat.com/api`
    pub api_base_url: String,

    /// Cadence of the incremental poll.
    /// Env: `CAUSERIE_POLL_INTERVAL_MS`
    /// Default: 3 s
    pub poll_interval: Duration,

    /// Timeout applied to every API request.
    /// Env: `CAUSERIE_REQUEST_TIMEOUT_MS`
    /// Default: 10 s
    pub request_timeout: Duration,

    /// Scroll distance from the top of the loaded range below which an
    /// older page is requested.
    /// Env: `CAUSERIE_PAGE_TRIGGER_PX`
    /// Default: `100.0`
    pub page_trigger_threshold: f64,

    /// Seed for placeholder avatar assignment; `None` draws from entropy.
    /// Env: `CAUSERIE_FALLBACK_SEED`
    pub fallback_seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            page_trigger_threshold: DEFAULT_PAGE_TRIGGER_THRESHOLD,
            fallback_seed: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CAUSERIE_API_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }

        if let Some(val) = lookup("CAUSERIE_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid CAUSERIE_POLL_INTERVAL_MS, using default"),
            }
        }

        if let Some(val) = lookup("CAUSERIE_REQUEST_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.request_timeout = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid CAUSERIE_REQUEST_TIMEOUT_MS, using default"),
            }
        }

        if let Some(val) = lookup("CAUSERIE_PAGE_TRIGGER_PX") {
            match val.parse::<f64>() {
                Ok(px) if px.is_finite() && px >= 0.0 => config.page_trigger_threshold = px,
                _ => tracing::warn!(value = %val, "Invalid CAUSERIE_PAGE_TRIGGER_PX, using default"),
            }
        }

        if let Some(val) = lookup("CAUSERIE_FALLBACK_SEED") {
            match val.parse::<u64>() {
                Ok(seed) => config.fallback_seed = Some(seed),
                Err(_) => tracing::warn!(value = %val, "Invalid CAUSERIE_FALLBACK_SEED, using entropy"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> Result<(), CauserieError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(CauserieError::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(CauserieError::Config("poll_interval must be non-zero".into()));
        }
        Ok(())
    }
}
