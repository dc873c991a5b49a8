use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const ENV_DATABASE_PATH: &str = "TASKPULSE_DATABASE_PATH";
pub const ENV_LOG_DIR: &str = "TASKPULSE_LOG_DIR";
pub const ENV_LOG_DIRECTIVES: &str = "TASKPULSE_LOG";
pub const ENV_TIMEZONE: &str = "TASKPULSE_TIMEZONE";

const APP_DIR_NAME: &str = "taskpulse";
const DATABASE_FILE_NAME: &str = "taskpulse.sqlite";
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::db=info,app::analytics=debug";

/// Runtime settings resolved from `.env`, the process environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_directives: String,
    /// Zone used for "local" calendar arithmetic: weekdays, month and year boundaries.
    pub timezone: Tz,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        // A missing .env file is the common case.
        if let Ok(path) = dotenvy::dotenv() {
            debug!(env_file = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = default_data_dir();

        let database_path = lookup(ENV_DATABASE_PATH)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE_NAME));

        let log_dir = lookup(ENV_LOG_DIR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        let log_directives = lookup(ENV_LOG_DIRECTIVES)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVES.to_string());

        let timezone = match lookup(ENV_TIMEZONE) {
            Some(name) if !name.trim().is_empty() => parse_timezone(&name)?,
            _ => Tz::UTC,
        };

        Ok(Self {
            database_path,
            log_dir,
            log_directives,
            timezone,
        })
    }

    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    pub fn with_log_dir(mut self, path: PathBuf) -> Self {
        self.log_dir = path;
        self
    }

    pub fn with_timezone(mut self, name: &str) -> AppResult<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }
}

pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    Tz::from_str(name.trim())
        .map_err(|_| AppError::validation(format!("unknown timezone: {}", name.trim())))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
