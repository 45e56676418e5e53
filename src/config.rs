//! Configuration module
//!
//! Settings are read from the environment. `Config::from_lookup` takes any
//! key lookup so tests do not have to mutate the process environment.

use crate::error::{AppError, AppResult};
use log::info;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client and endpoint settings for Google Calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base_url: String,
    pub token_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub sync_interval: Duration,
    pub google: GoogleConfig,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::config(format!("{} must be set", key)))
        };

        let database_url = match lookup("ONTIME_DATABASE_URL") {
            Some(url) => url,
            None => default_database_url()?,
        };

        let sync_interval = match lookup("ONTIME_SYNC_INTERVAL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AppError::config(format!("ONTIME_SYNC_INTERVAL_SECS '{}' is not a number: {}", raw, e))
            })?,
            None => DEFAULT_SYNC_INTERVAL_SECS,
        };

        let google = GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            api_base_url: lookup("GOOGLE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_API_BASE_URL.to_string()),
            token_uri: lookup("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URI.to_string()),
        };

        Ok(Self {
            database_url,
            sync_interval: Duration::from_secs(sync_interval),
            google,
        })
    }

    /// Validates the configuration before anything is started.
    pub fn validate(&self) -> AppResult<()> {
        if self.sync_interval.is_zero() {
            return Err(AppError::config("Sync interval must be greater than zero"));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(AppError::config(format!(
                "Database URL '{}' must use the sqlite: scheme",
                self.database_url
            )));
        }

        for (name, value) in [
            ("GOOGLE_API_BASE_URL", &self.google.api_base_url),
            ("GOOGLE_TOKEN_URI", &self.google.token_uri),
        ] {
            let parsed = Url::parse(value)
                .map_err(|e| AppError::config(format!("{} '{}' is invalid: {}", name, value, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::config(format!("{} must be an http(s) URL", name)));
            }
        }

        info!(
            "Configuration valid (sync every {}s, database {})",
            self.sync_interval.as_secs(),
            self.database_url
        );
        Ok(())
    }
}

fn default_database_url() -> AppResult<String> {
    let dir: PathBuf = dirs::data_dir()
        .ok_or_else(|| AppError::config("No data directory available; set ONTIME_DATABASE_URL"))?
        .join("ontime");
    std::fs::create_dir_all(&dir)
        .map_err(|e| AppError::config(format!("Cannot create {}: {}", dir.display(), e)))?;
    Ok(format!("sqlite://{}?mode=rwc", dir.join("ontime.db").display()))
}
