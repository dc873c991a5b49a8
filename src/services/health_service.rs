use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::health_repository::{HealthQuery, HealthRepository, HealthRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::health::{
    HealthCreateInput, HealthData, HealthFilters, HealthRecord, HealthStats, HealthUpdateInput,
    VALID_CATEGORIES, VALID_MEAL_TYPES, VALID_SEVERITIES,
};
use crate::services::task_analytics::parse_timestamp;
use crate::services::{normalize_date, normalize_optional_string, now_rfc3339, require_user};

const CATEGORY_ALL: &str = "all";

#[derive(Clone)]
pub struct HealthService {
    db: DbPool,
}

impl HealthService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_record(&self, input: HealthCreateInput) -> AppResult<HealthRecord> {
        if input.title.trim().is_empty()
            || input.category.trim().is_empty()
            || input.user_id.trim().is_empty()
        {
            return Err(AppError::validation(
                "Title, category, and userId are required",
            ));
        }

        let data = input.data.unwrap_or_default();
        validate_data(&data)?;

        let now = now_rfc3339();
        let date_recorded = match normalize_optional_string(input.date_recorded) {
            Some(raw) => normalize_date(&raw, "dateRecorded")?,
            None => now.clone(),
        };

        let record = HealthRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            category: normalize_category(&input.category)?,
            data,
            notes: normalize_optional_string(input.notes),
            attachments: input.attachments.unwrap_or_default(),
            date_recorded,
            is_private: input.is_private.unwrap_or(true),
            user_id: input.user_id.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let row = HealthRow::from_record(&record)?;
        self.db.with_connection(|conn| {
            require_user(conn, &row.user_id)?;
            HealthRepository::insert(conn, &row)
        })?;
        info!(
            record_id = %record.id,
            user_id = %record.user_id,
            category = %record.category,
            "health record created"
        );
        Ok(record)
    }

    /// Records of an existing user. The date range applies only when both
    /// bounds are present.
    pub fn list_by_user(
        &self,
        user_id: &str,
        filters: HealthFilters,
    ) -> AppResult<Vec<HealthRecord>> {
        self.db
            .with_connection(|conn| require_user(conn, user_id))?;

        let range = match (
            normalize_optional_string(filters.start_date),
            normalize_optional_string(filters.end_date),
        ) {
            (Some(start), Some(end)) => {
                let start = parse_bound(&start, "startDate")?;
                let end = parse_bound(&end, "endDate")?;
                Some((start, end))
            }
            _ => None,
        };

        let records = self
            .list_records(HealthFilters {
                user_id: Some(user_id.to_string()),
                category: filters.category,
                ..Default::default()
            })?
            .into_iter()
            .filter(|record| match range {
                Some((start, end)) => parse_timestamp(&record.date_recorded)
                    .is_some_and(|at| at >= start && at <= end),
                None => true,
            })
            .collect::<Vec<_>>();

        debug!(
            user_id = %user_id,
            count = records.len(),
            ranged = range.is_some(),
            "health records listed for user"
        );
        Ok(records)
    }

    /// Newest `dateRecorded` first.
    pub fn list_records(&self, filters: HealthFilters) -> AppResult<Vec<HealthRecord>> {
        let query = HealthQuery {
            user_id: filters.user_id.filter(|id| !id.trim().is_empty()),
            category: filters
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty() && c != CATEGORY_ALL),
        };

        let rows = self
            .db
            .with_connection(|conn| HealthRepository::list(conn, &query))?;
        let records = rows
            .into_iter()
            .map(HealthRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(count = records.len(), "health records listed");
        Ok(records)
    }

    pub fn get_record(&self, id: &str) -> AppResult<HealthRecord> {
        let row = self
            .db
            .with_connection(|conn| HealthRepository::find_by_id(conn, id))?
            .ok_or_else(|| AppError::not_found("health record"))?;
        row.into_record()
    }

    pub fn update_record(&self, id: &str, update: HealthUpdateInput) -> AppResult<HealthRecord> {
        let mut record = self.get_record(id)?;

        if let Some(title) = update.title.filter(|v| !v.trim().is_empty()) {
            record.title = title.trim().to_string();
        }
        if let Some(category) = update.category.filter(|v| !v.trim().is_empty()) {
            record.category = normalize_category(&category)?;
        }
        if let Some(data) = update.data {
            validate_data(&data)?;
            record.data = data;
        }
        if let Some(notes) = update.notes {
            record.notes = normalize_optional_string(notes);
        }
        if let Some(attachments) = update.attachments {
            record.attachments = attachments;
        }
        if let Some(date_recorded) = update.date_recorded.filter(|v| !v.trim().is_empty()) {
            record.date_recorded = normalize_date(&date_recorded, "dateRecorded")?;
        }
        if let Some(is_private) = update.is_private {
            record.is_private = is_private;
        }
        record.updated_at = now_rfc3339();

        let row = HealthRow::from_record(&record)?;
        self.db
            .with_connection(|conn| HealthRepository::update(conn, &row))?;
        info!(record_id = %record.id, "health record updated");
        Ok(record)
    }

    pub fn delete_record(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| HealthRepository::delete(conn, id))?;
        info!(record_id = %id, "health record deleted");
        Ok(())
    }

    pub fn health_stats(&self, user_id: &str) -> AppResult<HealthStats> {
        let records = self.list_by_user(user_id, HealthFilters::default())?;

        let mut category_count = BTreeMap::new();
        for record in &records {
            *category_count.entry(record.category.clone()).or_insert(0) += 1;
        }

        Ok(HealthStats {
            total_entries: records.len(),
            category_count,
        })
    }
}

fn normalize_category(value: &str) -> AppResult<String> {
    let category = value.trim().to_lowercase();
    if VALID_CATEGORIES.contains(&category.as_str()) {
        Ok(category)
    } else {
        Err(AppError::validation_with_details(
            "Unsupported health category",
            json!({ "category": value, "allowed": VALID_CATEGORIES }),
        ))
    }
}

fn validate_data(data: &HealthData) -> AppResult<()> {
    if let Some(severity) = data.severity.as_deref() {
        if !VALID_SEVERITIES.contains(&severity) {
            return Err(AppError::validation_with_details(
                "Unsupported symptom severity",
                json!({ "severity": severity, "allowed": VALID_SEVERITIES }),
            ));
        }
    }
    if let Some(meal_type) = data.meal_type.as_deref() {
        if !VALID_MEAL_TYPES.contains(&meal_type) {
            return Err(AppError::validation_with_details(
                "Unsupported meal type",
                json!({ "mealType": meal_type, "allowed": VALID_MEAL_TYPES }),
            ));
        }
    }

    let measurements = [
        ("heartRate", data.heart_rate),
        ("weight", data.weight),
        ("height", data.height),
        ("temperature", data.temperature),
        ("duration", data.duration),
        ("calories", data.calories),
    ];
    for (field, value) in measurements {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(AppError::validation(format!("{field} must be a finite number")));
        }
    }
    Ok(())
}

fn parse_bound(value: &str, field: &str) -> AppResult<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(value)
        .ok_or_else(|| {
            AppError::validation(format!(
                "{field} must be an RFC 3339 timestamp or YYYY-MM-DD date"
            ))
        })
}
