use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventPriority {
    Critical,
    #[default]
    High,
    Medium,
}

impl EventPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPriority::Critical => "critical",
            EventPriority::High => "high",
            EventPriority::Medium => "medium",
        }
    }
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventPriority {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "critical" => Ok(EventPriority::Critical),
            "high" => Ok(EventPriority::High),
            "medium" => Ok(EventPriority::Medium),
            other => Err(format!("unsupported event priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    #[default]
    Upcoming,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::InProgress => "in-progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "upcoming" => Ok(EventStatus::Upcoming),
            "in-progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!("unsupported event status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub event_time: String,
    pub location: Option<String>,
    pub priority: EventPriority,
    pub status: EventStatus,
    pub reminder_set: bool,
    pub reminder_time: Option<String>,
    pub contact_info: Option<ContactInfo>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventCreateInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub event_time: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub priority: Option<EventPriority>,
    #[serde(default)]
    pub reminder_set: Option<bool>,
    #[serde(default)]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<EventPriority>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub reminder_set: Option<bool>,
    #[serde(default)]
    pub reminder_time: Option<Option<String>>,
    #[serde(default)]
    pub contact_info: Option<Option<ContactInfo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UrgentEventFilters {
    pub user_id: Option<String>,
    pub priority: Option<EventPriority>,
    pub status: Option<EventStatus>,
    /// Future events that are not completed; overrides `status`.
    pub upcoming: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventStats {
    pub total_events: usize,
    pub critical_events: usize,
    pub upcoming_events: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: String,
    pub title: String,
    pub event_date: String,
    pub event_time: String,
    pub priority: EventPriority,
}

impl From<&UrgentEventRecord> for UpcomingEvent {
    fn from(event: &UrgentEventRecord) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            event_date: event.event_date.clone(),
            event_time: event.event_time.clone(),
            priority: event.priority,
        }
    }
}
