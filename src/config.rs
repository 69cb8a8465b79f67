use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::auth::DEFAULT_IDENTITY_URL;
use crate::route::Route;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an http(s) URL, got '{value}'")]
    NotHttpUrl { name: &'static str, value: String },

    #[error("toast duration must be greater than zero")]
    ZeroToastDuration,

    #[error("no data directory on this platform; pass --log-dir")]
    NoDataDir,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "taskboard", about = "Kanban board for a remote task API")]
pub struct Config {
    /// Base URL of the task API.
    #[arg(long, env = "TASKBOARD_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    #[arg(long, env = "TASKBOARD_FIREBASE_API_KEY", hide_env_values = true)]
    pub firebase_api_key: String,

    #[arg(long, env = "TASKBOARD_IDENTITY_URL", default_value = DEFAULT_IDENTITY_URL)]
    pub identity_url: String,

    /// How long a toast stays up, in milliseconds.
    #[arg(long, env = "TASKBOARD_TOAST_MS", default_value_t = 4000)]
    pub toast_ms: u64,

    #[arg(long, env = "TASKBOARD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Screen to open first, e.g. /TaskManagement.
    #[arg(long, default_value = "/Dashboard")]
    pub start: String,
}

impl Config {
    /// Reads `.env` (if any) and then the command line.
    pub fn load() -> Self {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        Config::parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("api-url", &self.api_url), ("identity-url", &self.identity_url)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::NotHttpUrl {
                    name,
                    value: value.clone(),
                });
            }
        }
        if self.toast_ms == 0 {
            return Err(ConfigError::ZeroToastDuration);
        }
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn log_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("taskboard").join("logs"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn start_route(&self) -> Route {
        Route::parse(&self.start)
    }
}
