use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use taskpulse_app_lib::commands::{
    analytics, dashboard, events, health, notes, tasks, users, AppState, CommandError,
    CommandResult,
};
use taskpulse_app_lib::config::{ENV_DATABASE_PATH, ENV_LOG_DIR, ENV_TIMEZONE};

/// Personal productivity backend: users, tasks, notes, urgent events,
/// health records, dashboards and task analytics.
///
/// Payloads are JSON objects using camelCase keys, for example
///   taskpulse tasks register --json '{"title":"Write report",...}'
#[derive(Debug, Parser)]
#[command(name = "taskpulse", version, about)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = ENV_DATABASE_PATH, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Directory for rolling log files.
    #[arg(long, global = true, env = ENV_LOG_DIR, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// IANA zone used for weekdays and calendar boundaries.
    #[arg(long, global = true, env = ENV_TIMEZONE, value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Print compact JSON instead of pretty JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// User accounts.
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Tasks.
    Tasks {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Notes.
    Notes {
        #[command(subcommand)]
        action: NoteCommands,
    },
    /// Urgent events.
    Events {
        #[command(subcommand)]
        action: EventCommands,
    },
    /// Health records.
    Health {
        #[command(subcommand)]
        action: HealthCommands,
    },
    /// Dashboard summaries.
    Dashboard {
        #[command(subcommand)]
        action: DashboardCommands,
    },
    /// Task analytics.
    Analytics {
        #[command(subcommand)]
        action: AnalyticsCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    /// Register a user from `{username, password, email}`.
    Add {
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    /// Check that a user exists, optionally verifying the password.
    Check {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    List,
    Get { user_id: String },
    /// User together with all of their tasks.
    WithTasks { user_id: String },
    Update {
        user_id: String,
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    /// Delete a user and everything they own.
    Delete { user_id: String },
    Stats { user_id: String },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    Register {
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    List {
        #[arg(long)]
        user_id: Option<String>,
    },
    ByUser { user_id: String },
    Update {
        id: String,
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum NoteCommands {
    Create {
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    /// Notes of one user; filters are `{category, isPinned, search}`.
    ByUser {
        user_id: String,
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    List {
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    Get { id: String },
    Update {
        id: String,
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    Delete { id: String },
    TogglePin { id: String },
    Stats { user_id: String },
}

#[derive(Debug, Subcommand)]
pub enum EventCommands {
    Create {
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    /// Events of one user; filters are `{priority, status, upcoming}`.
    ByUser {
        user_id: String,
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    List {
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    Update {
        id: String,
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    Delete { id: String },
    Stats { user_id: String },
}

#[derive(Debug, Subcommand)]
pub enum HealthCommands {
    Create {
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    /// Records of one user; filters are `{category, startDate, endDate}`.
    ByUser {
        user_id: String,
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    List {
        #[arg(long, value_parser = parse_json)]
        filters: Option<JsonValue>,
    },
    Update {
        id: String,
        #[arg(long, value_parser = parse_json)]
        json: JsonValue,
    },
    Delete { id: String },
    Stats { user_id: String },
}

#[derive(Debug, Subcommand)]
pub enum DashboardCommands {
    /// Full dashboard; timeframe is week, month, year or all.
    User {
        user_id: String,
        #[arg(long)]
        timeframe: Option<String>,
    },
    TaskStats {
        user_id: String,
        #[arg(long)]
        timeframe: Option<String>,
    },
    Trends {
        user_id: String,
        #[arg(long)]
        months: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommands {
    /// Status breakdown of a user's tasks, or of a JSON task array.
    Tasks {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, value_parser = parse_json)]
        tasks: Option<JsonValue>,
    },
    Productivity {
        user_id: String,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    CompletionTimes { user_id: String },
    Full { user_id: String },
    /// Run every analyzer over a JSON file holding a task array.
    Inspect { file: PathBuf },
}

fn parse_json(raw: &str) -> Result<JsonValue, String> {
    serde_json::from_str(raw).map_err(|err| format!("not valid JSON: {err}"))
}

fn payload<T: DeserializeOwned>(value: JsonValue) -> CommandResult<T> {
    serde_json::from_value(value).map_err(|err| {
        CommandError::new("VALIDATION_ERROR", format!("Malformed payload: {err}"), None)
    })
}

fn optional_payload<T: DeserializeOwned>(value: Option<JsonValue>) -> CommandResult<Option<T>> {
    value.map(payload).transpose()
}

fn render<T: Serialize>(value: T) -> CommandResult<JsonValue> {
    serde_json::to_value(value).map_err(|err| {
        CommandError::new("UNKNOWN", format!("Failed to serialize response: {err}"), None)
    })
}

pub async fn dispatch(state: &AppState, command: Commands) -> CommandResult<JsonValue> {
    match command {
        Commands::Users { action } => match action {
            UserCommands::Add { json } => render(users::users_add(state, payload(json)?).await?),
            UserCommands::Check { username, password } => render(
                users::users_check(state, users::UserCheckPayload { username, password }).await?,
            ),
            UserCommands::List => render(users::users_list(state).await?),
            UserCommands::Get { user_id } => render(users::users_get(state, user_id).await?),
            UserCommands::WithTasks { user_id } => {
                render(users::users_get_with_tasks(state, user_id).await?)
            }
            UserCommands::Update { user_id, json } => {
                render(users::users_update(state, user_id, payload(json)?).await?)
            }
            UserCommands::Delete { user_id } => render(users::users_delete(state, user_id).await?),
            UserCommands::Stats { user_id } => render(users::users_stats(state, user_id).await?),
        },
        Commands::Tasks { action } => match action {
            TaskCommands::Register { json } => {
                render(tasks::tasks_register(state, payload(json)?).await?)
            }
            TaskCommands::List { user_id } => render(tasks::tasks_list(state, user_id).await?),
            TaskCommands::ByUser { user_id } => {
                render(tasks::tasks_list_by_user(state, user_id).await?)
            }
            TaskCommands::Update { id, json } => {
                render(tasks::tasks_update(state, id, payload(json)?).await?)
            }
            TaskCommands::Delete { id } => render(tasks::tasks_delete(state, id).await?),
        },
        Commands::Notes { action } => match action {
            NoteCommands::Create { json } => {
                render(notes::notes_create(state, payload(json)?).await?)
            }
            NoteCommands::ByUser { user_id, filters } => render(
                notes::notes_list_by_user(state, user_id, optional_payload(filters)?).await?,
            ),
            NoteCommands::List { filters } => {
                render(notes::notes_list(state, optional_payload(filters)?).await?)
            }
            NoteCommands::Get { id } => render(notes::notes_get(state, id).await?),
            NoteCommands::Update { id, json } => {
                render(notes::notes_update(state, id, payload(json)?).await?)
            }
            NoteCommands::Delete { id } => render(notes::notes_delete(state, id).await?),
            NoteCommands::TogglePin { id } => render(notes::notes_toggle_pin(state, id).await?),
            NoteCommands::Stats { user_id } => render(notes::notes_stats(state, user_id).await?),
        },
        Commands::Events { action } => match action {
            EventCommands::Create { json } => {
                render(events::events_create(state, payload(json)?).await?)
            }
            EventCommands::ByUser { user_id, filters } => render(
                events::events_list_by_user(state, user_id, optional_payload(filters)?).await?,
            ),
            EventCommands::List { filters } => {
                render(events::events_list(state, optional_payload(filters)?).await?)
            }
            EventCommands::Update { id, json } => {
                render(events::events_update(state, id, payload(json)?).await?)
            }
            EventCommands::Delete { id } => render(events::events_delete(state, id).await?),
            EventCommands::Stats { user_id } => render(events::events_stats(state, user_id).await?),
        },
        Commands::Health { action } => match action {
            HealthCommands::Create { json } => {
                render(health::health_create(state, payload(json)?).await?)
            }
            HealthCommands::ByUser { user_id, filters } => render(
                health::health_list_by_user(state, user_id, optional_payload(filters)?).await?,
            ),
            HealthCommands::List { filters } => {
                render(health::health_list(state, optional_payload(filters)?).await?)
            }
            HealthCommands::Update { id, json } => {
                render(health::health_update(state, id, payload(json)?).await?)
            }
            HealthCommands::Delete { id } => render(health::health_delete(state, id).await?),
            HealthCommands::Stats { user_id } => {
                render(health::health_stats(state, user_id).await?)
            }
        },
        Commands::Dashboard { action } => match action {
            DashboardCommands::User { user_id, timeframe } => {
                render(dashboard::dashboard_user(state, user_id, timeframe).await?)
            }
            DashboardCommands::TaskStats { user_id, timeframe } => {
                render(dashboard::dashboard_task_stats(state, user_id, timeframe).await?)
            }
            DashboardCommands::Trends { user_id, months } => {
                render(dashboard::dashboard_trends(state, user_id, months).await?)
            }
        },
        Commands::Analytics { action } => match action {
            AnalyticsCommands::Tasks { user_id, tasks } => {
                render(analytics::analytics_analyze_tasks(state, user_id, tasks).await?)
            }
            AnalyticsCommands::Productivity {
                user_id,
                start_date,
                end_date,
            } => render(
                analytics::analytics_productivity(state, user_id, start_date, end_date).await?,
            ),
            AnalyticsCommands::CompletionTimes { user_id } => {
                render(analytics::analytics_completion_times(state, user_id).await?)
            }
            AnalyticsCommands::Full { user_id } => {
                render(analytics::analytics_full(state, user_id).await?)
            }
            AnalyticsCommands::Inspect { file } => {
                let raw = std::fs::read_to_string(&file).map_err(|err| {
                    CommandError::new(
                        "INVALID_INPUT",
                        format!("Cannot read {}: {err}", file.display()),
                        None,
                    )
                })?;
                let tasks = serde_json::from_str::<JsonValue>(&raw).map_err(|err| {
                    CommandError::new("INVALID_INPUT", format!("Not valid JSON: {err}"), None)
                })?;
                render(analytics::analytics_inspect(state, tasks).await?)
            }
        },
    }
}
