use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

pub const NO_COMPLETED_TASKS_MESSAGE: &str = "No completed tasks found for productivity analysis.";
pub const NO_TASKS_MESSAGE: &str = "No tasks found for analysis";
pub const NO_TIMED_TASKS_MESSAGE: &str = "No tasks with estimated time were found";

/// Loose task shape accepted from request payloads. Only the fields the
/// analyzers read are kept; anything else in the object is ignored, and a
/// field holding an unusable value reads as absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsTaskInput {
    #[serde(alias = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_minutes")]
    pub estimated_time: Option<f64>,
    #[serde(deserialize_with = "lenient_minutes")]
    pub actual_time: Option<f64>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
}

// Scalars become their text form; objects, arrays and null read as absent.
fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(text) => Some(text),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

// Numbers, or strings holding a number such as "30".
fn lenient_minutes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let minutes = match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(minutes.filter(|value| value.is_finite()))
}

// Strings are kept as given; integers are epoch milliseconds.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(text) => Some(text),
        JsonValue::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub tasks_by_status: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivitySummary {
    pub total_completed_tasks: usize,
    pub total_pending_tasks: usize,
    /// Day name to completed count; days without completions are absent.
    pub productivity_by_day: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductivityOutcome {
    NoCompletedTasks,
    Summary(ProductivitySummary),
}

impl ProductivityOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ProductivityOutcome::NoCompletedTasks => Some(NO_COMPLETED_TASKS_MESSAGE),
            ProductivityOutcome::Summary(_) => None,
        }
    }

    pub fn summary(&self) -> Option<&ProductivitySummary> {
        match self {
            ProductivityOutcome::Summary(summary) => Some(summary),
            ProductivityOutcome::NoCompletedTasks => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TimingCategory {
    Early,
    OnTime,
    Delayed,
}

impl TimingCategory {
    pub fn from_delta(delta: f64) -> Self {
        if delta < 0.0 {
            TimingCategory::Early
        } else if delta == 0.0 {
            TimingCategory::OnTime
        } else {
            TimingCategory::Delayed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimingCategory::Early => "early",
            TimingCategory::OnTime => "on-time",
            TimingCategory::Delayed => "delayed",
        }
    }
}

impl fmt::Display for TimingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTimeSummary {
    pub analyzed_tasks: usize,
    pub categorization: BTreeMap<TimingCategory, usize>,
    /// Mean of `actual - estimated`, two decimals.
    pub average_time_difference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionTimeOutcome {
    NoTasks,
    NoTimedTasks,
    Summary(CompletionTimeSummary),
}

impl CompletionTimeOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            CompletionTimeOutcome::NoTasks => Some(NO_TASKS_MESSAGE),
            CompletionTimeOutcome::NoTimedTasks => Some(NO_TIMED_TASKS_MESSAGE),
            CompletionTimeOutcome::Summary(_) => None,
        }
    }

    pub fn summary(&self) -> Option<&CompletionTimeSummary> {
        match self {
            CompletionTimeOutcome::Summary(summary) => Some(summary),
            _ => None,
        }
    }
}

// Notices serialize as `{"outcome": "...", "message": "..."}`; summaries carry
// their own fields next to `"outcome": "summary"`.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
enum ProductivityWire<'a> {
    NoCompletedTasks { message: &'static str },
    Summary(&'a ProductivitySummary),
}

impl Serialize for ProductivityOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            ProductivityOutcome::NoCompletedTasks => ProductivityWire::NoCompletedTasks {
                message: NO_COMPLETED_TASKS_MESSAGE,
            },
            ProductivityOutcome::Summary(summary) => ProductivityWire::Summary(summary),
        };
        wire.serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
enum CompletionTimeWire<'a> {
    NoTasks { message: &'static str },
    NoTimedTasks { message: &'static str },
    Summary(&'a CompletionTimeSummary),
}

impl Serialize for CompletionTimeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            CompletionTimeOutcome::NoTasks => CompletionTimeWire::NoTasks {
                message: NO_TASKS_MESSAGE,
            },
            CompletionTimeOutcome::NoTimedTasks => CompletionTimeWire::NoTimedTasks {
                message: NO_TIMED_TASKS_MESSAGE,
            },
            CompletionTimeOutcome::Summary(summary) => CompletionTimeWire::Summary(summary),
        };
        wire.serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeEcho {
    pub start: String,
    pub end: String,
}

impl DateRangeEcho {
    pub const ALL_TIME: &'static str = "all time";

    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.unwrap_or(Self::ALL_TIME).to_string(),
            end: end.unwrap_or(Self::ALL_TIME).to_string(),
        }
    }
}

/// Productivity analysis plus the bounds it was restricted to.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityReport {
    #[serde(flatten)]
    pub analysis: ProductivityOutcome,
    pub date_range: DateRangeEcho,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub patterns: PatternSummary,
    pub productivity: ProductivityOutcome,
    pub completion_times: CompletionTimeOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysisReport {
    pub user: String,
    pub stats: AnalysisStats,
    pub total_tasks: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notices_serialize_with_outcome_tag_and_message() {
        let value = serde_json::to_value(CompletionTimeOutcome::NoTimedTasks).unwrap();
        assert_eq!(
            value,
            json!({ "outcome": "noTimedTasks", "message": NO_TIMED_TASKS_MESSAGE })
        );
    }

    #[test]
    fn summary_serializes_flat_with_kebab_categories() {
        let mut categorization = BTreeMap::new();
        categorization.insert(TimingCategory::OnTime, 2);
        let outcome = CompletionTimeOutcome::Summary(CompletionTimeSummary {
            analyzed_tasks: 2,
            categorization,
            average_time_difference: 0.0,
        });

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "summary");
        assert_eq!(value["analyzedTasks"], 2);
        assert_eq!(value["categorization"]["on-time"], 2);
    }

    #[test]
    fn payload_task_accepts_mongo_style_id() {
        let task: AnalyticsTaskInput =
            serde_json::from_value(json!({ "_id": "abc", "status": "pending", "title": "x" }))
                .unwrap();
        assert_eq!(task.id.as_deref(), Some("abc"));
        assert_eq!(task.status.as_deref(), Some("pending"));
    }
}
