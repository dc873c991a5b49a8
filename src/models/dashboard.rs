use serde::{Deserialize, Serialize};

use crate::models::event::UpcomingEvent;
use crate::models::note::NoteActivity;
use crate::models::task::TaskActivity;
use crate::models::user::PublicUser;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Timeframe {
    /// Unknown or missing values fall back to `All`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("week") => Timeframe::Week,
            Some("month") => Timeframe::Month,
            Some("year") => Timeframe::Year,
            _ => Timeframe::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: String,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completion_percentage: u32,
    pub status_distribution: Vec<StatusShare>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_notes: usize,
    pub total_urgent_events: usize,
    pub total_health_entries: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub tasks: Vec<TaskActivity>,
    pub notes: Vec<NoteActivity>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboard {
    pub user: PublicUser,
    pub timeframe: Timeframe,
    pub task_stats: DashboardTaskStats,
    pub overall_stats: OverallStats,
    pub recent_activity: RecentActivity,
    pub upcoming_events: Vec<UpcomingEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completion_percentage: u32,
    pub pending_percentage: u32,
    pub in_progress_percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
    pub percentages: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionReport {
    pub timeframe: Timeframe,
    pub stats: TaskCompletionStats,
    pub chart_data: ChartData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// e.g. `March 2025`.
    pub month: String,
    /// e.g. `2025-03`.
    pub month_key: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u32,
}
