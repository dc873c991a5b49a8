pub mod analytics;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod notes;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::task;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::analysis_service::AnalysisService;
use crate::services::dashboard_service::DashboardService;
use crate::services::event_service::EventService;
use crate::services::health_service::HealthService;
use crate::services::note_service::NoteService;
use crate::services::task_service::TaskService;
use crate::services::user_service::UserService;

/// Shared handles every command runs against.
#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    timezone: Tz,
    user_service: Arc<UserService>,
    task_service: Arc<TaskService>,
    note_service: Arc<NoteService>,
    event_service: Arc<EventService>,
    health_service: Arc<HealthService>,
    dashboard_service: Arc<DashboardService>,
    analysis_service: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(db_pool: DbPool, timezone: Tz) -> Self {
        Self {
            user_service: Arc::new(UserService::new(db_pool.clone())),
            task_service: Arc::new(TaskService::new(db_pool.clone())),
            note_service: Arc::new(NoteService::new(db_pool.clone())),
            event_service: Arc::new(EventService::new(db_pool.clone())),
            health_service: Arc::new(HealthService::new(db_pool.clone())),
            dashboard_service: Arc::new(DashboardService::new(db_pool.clone(), timezone)),
            analysis_service: Arc::new(AnalysisService::new(db_pool.clone(), timezone)),
            db_pool,
            timezone,
        }
    }

    /// Opens the configured database and wires every service to it.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let pool = DbPool::new(&config.database_path)?;
        Ok(Self::new(pool, config.timezone))
    }

    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.user_service)
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }

    pub fn notes(&self) -> Arc<NoteService> {
        Arc::clone(&self.note_service)
    }

    pub fn events(&self) -> Arc<EventService> {
        Arc::clone(&self.event_service)
    }

    pub fn health(&self) -> Arc<HealthService> {
        Arc::clone(&self.health_service)
    }

    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard_service)
    }

    pub fn analysis(&self) -> Arc<AnalysisService> {
        Arc::clone(&self.analysis_service)
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Response carrying only the human-readable outcome.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    /// HTTP status a web front end should answer with.
    pub fn http_status(&self) -> u16 {
        match self.code.as_str() {
            "VALIDATION_ERROR" | "INVALID_INPUT" | "CONFLICT" => 400,
            "NOT_FOUND" => 404,
            _ => 500,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::InvalidInput { message } => CommandError::new("INVALID_INPUT", message, None),
            AppError::NotFound { entity } => {
                CommandError::new("NOT_FOUND", not_found_message(entity), None)
            }
            AppError::Conflict { message } => {
                warn!(target: "app::command", %message, "conflict in command");
                CommandError::new("CONFLICT", message, None)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Failed to serialize data", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "File system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

fn not_found_message(entity: &str) -> String {
    match entity {
        "user" => "User not found".to_string(),
        "tasks" => "No tasks found for this user".to_string(),
        "completed tasks" => "No completed tasks found".to_string(),
        "tasks with time estimates" => "No tasks with time estimates found".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                None => "Resource not found".to_string(),
            }
        }
    }
}

/// Runs a blocking service call on the tokio blocking pool.
pub(crate) async fn run_blocking<T: Send + 'static>(
    job: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    task::spawn_blocking(job)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("Background job failed: {err}"), None))?
        .map_err(CommandError::from)
}
