use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_FILE: &str = ".cinereel_token";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_base(&api_url.into()),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("CATALOG_API_URL")
            .filter(|s| !s.trim().is_empty())
            .context("CATALOG_API_URL not set")?;
        let mut config = Self::new(api_url);

        if let Some(path) = lookup("CATALOG_TOKEN_FILE").filter(|s| !s.trim().is_empty()) {
            config.token_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup("CATALOG_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("CATALOG_TIMEOUT_SECS is not a number: {raw}"))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("CATALOG_SEARCH_DEBOUNCE_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("CATALOG_SEARCH_DEBOUNCE_MS is not a number: {raw}"))?;
            config.search_debounce = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn normalize_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
