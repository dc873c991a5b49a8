mod cli;

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use taskpulse_app_lib::commands::{AppState, CommandError};
use taskpulse_app_lib::config::AppConfig;
use taskpulse_app_lib::utils::logger::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let compact = cli.compact;

    match run(cli).await {
        Ok(value) => {
            print_json(&value, compact);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let value = json!({
                "status": err.http_status(),
                "code": err.code,
                "message": err.message,
                "details": err.details,
            });
            eprintln!("{}", to_text(&value, compact));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: cli::Cli) -> Result<serde_json::Value, CommandError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = cli.db {
        config = config.with_database_path(path);
    }
    if let Some(dir) = cli.log_dir {
        config = config.with_log_dir(dir);
    }
    if let Some(zone) = cli.timezone.as_deref() {
        config = config.with_timezone(zone)?;
    }

    init_logging(&config)?;
    info!(
        db_path = %config.database_path.display(),
        timezone = %config.timezone,
        "taskpulse starting"
    );

    let state = AppState::from_config(&config)?;
    let result = cli::dispatch(&state, cli.command).await;
    if let Err(err) = &result {
        error!(code = %err.code, message = %err.message, "command failed");
    }
    result
}

fn print_json(value: &serde_json::Value, compact: bool) {
    println!("{}", to_text(value, compact));
}

fn to_text(value: &serde_json::Value, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}
