use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::db::repositories::event_repository::{
    UrgentEventQuery, UrgentEventRepository, UrgentEventRow,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::event::{
    ContactInfo, EventPriority, EventStatus, UrgentEventCreateInput, UrgentEventFilters,
    UrgentEventRecord, UrgentEventStats, UrgentEventUpdateInput,
};
use crate::services::task_analytics::parse_timestamp;
use crate::services::{normalize_date, normalize_optional_string, now_rfc3339, require_user};

#[derive(Clone)]
pub struct EventService {
    db: DbPool,
}

impl EventService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_event(&self, input: UrgentEventCreateInput) -> AppResult<UrgentEventRecord> {
        if [
            &input.title,
            &input.description,
            &input.event_date,
            &input.event_time,
            &input.user_id,
        ]
        .iter()
        .any(|value| value.trim().is_empty())
        {
            return Err(AppError::validation(
                "Title, description, event date, event time, and userId are required",
            ));
        }

        let now = now_rfc3339();
        let record = UrgentEventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            event_date: normalize_date(&input.event_date, "eventDate")?,
            event_time: input.event_time.trim().to_string(),
            location: normalize_optional_string(input.location),
            priority: input.priority.unwrap_or_default(),
            status: EventStatus::default(),
            reminder_set: input.reminder_set.unwrap_or(false),
            reminder_time: normalize_reminder(input.reminder_time)?,
            contact_info: normalize_contact(input.contact_info),
            user_id: input.user_id.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let row = UrgentEventRow::from_record(&record)?;
        self.db.with_connection(|conn| {
            require_user(conn, &row.user_id)?;
            UrgentEventRepository::insert(conn, &row)
        })?;
        info!(
            event_id = %record.id,
            user_id = %record.user_id,
            priority = %record.priority,
            "urgent event created"
        );
        Ok(record)
    }

    /// Events of an existing user. With `upcoming` set only future events
    /// that are not completed remain, whatever `status` says.
    pub fn list_by_user(
        &self,
        user_id: &str,
        filters: UrgentEventFilters,
    ) -> AppResult<Vec<UrgentEventRecord>> {
        self.db
            .with_connection(|conn| require_user(conn, user_id))?;
        self.list_events(UrgentEventFilters {
            user_id: Some(user_id.to_string()),
            ..filters
        })
    }

    /// Ordered by priority (critical, high, medium), then soonest first.
    pub fn list_events(&self, filters: UrgentEventFilters) -> AppResult<Vec<UrgentEventRecord>> {
        let upcoming_only = filters.upcoming.unwrap_or(false);
        let query = UrgentEventQuery {
            user_id: filters.user_id.filter(|id| !id.trim().is_empty()),
            priority: filters.priority,
            status: if upcoming_only { None } else { filters.status },
        };

        let rows = self
            .db
            .with_connection(|conn| UrgentEventRepository::list(conn, &query))?;
        let now = Utc::now();
        let events = rows
            .into_iter()
            .map(UrgentEventRow::into_record)
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .filter(|event| !upcoming_only || is_upcoming(event, now))
            .collect::<Vec<_>>();

        debug!(count = events.len(), upcoming_only, "urgent events listed");
        Ok(events)
    }

    pub fn get_event(&self, id: &str) -> AppResult<UrgentEventRecord> {
        let row = self
            .db
            .with_connection(|conn| UrgentEventRepository::find_by_id(conn, id))?
            .ok_or_else(|| AppError::not_found("urgent event"))?;
        row.into_record()
    }

    pub fn update_event(
        &self,
        id: &str,
        update: UrgentEventUpdateInput,
    ) -> AppResult<UrgentEventRecord> {
        let mut event = self.get_event(id)?;

        if let Some(title) = update.title.filter(|v| !v.trim().is_empty()) {
            event.title = title.trim().to_string();
        }
        if let Some(description) = update.description.filter(|v| !v.trim().is_empty()) {
            event.description = description;
        }
        if let Some(event_date) = update.event_date.filter(|v| !v.trim().is_empty()) {
            event.event_date = normalize_date(&event_date, "eventDate")?;
        }
        if let Some(event_time) = update.event_time.filter(|v| !v.trim().is_empty()) {
            event.event_time = event_time.trim().to_string();
        }
        if let Some(location) = update.location {
            event.location = normalize_optional_string(location);
        }
        if let Some(priority) = update.priority {
            event.priority = priority;
        }
        if let Some(status) = update.status {
            event.status = status;
        }
        if let Some(reminder_set) = update.reminder_set {
            event.reminder_set = reminder_set;
        }
        if let Some(reminder_time) = update.reminder_time {
            event.reminder_time = normalize_reminder(reminder_time)?;
        }
        if let Some(contact_info) = update.contact_info {
            event.contact_info = normalize_contact(contact_info);
        }
        event.updated_at = now_rfc3339();

        let row = UrgentEventRow::from_record(&event)?;
        self.db
            .with_connection(|conn| UrgentEventRepository::update(conn, &row))?;
        info!(event_id = %event.id, status = %event.status, "urgent event updated");
        Ok(event)
    }

    pub fn delete_event(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| UrgentEventRepository::delete(conn, id))?;
        info!(event_id = %id, "urgent event deleted");
        Ok(())
    }

    pub fn event_stats(&self, user_id: &str) -> AppResult<UrgentEventStats> {
        let events = self.list_by_user(user_id, UrgentEventFilters::default())?;
        let now = Utc::now();

        let stats = UrgentEventStats {
            total_events: events.len(),
            critical_events: events
                .iter()
                .filter(|e| e.priority == EventPriority::Critical)
                .count(),
            upcoming_events: events.iter().filter(|e| is_upcoming(e, now)).count(),
        };
        debug!(user_id = %user_id, total = stats.total_events, "urgent event stats computed");
        Ok(stats)
    }

    /// The `limit` soonest upcoming events of a user, soonest first.
    pub fn upcoming_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<UrgentEventRecord>> {
        let mut events = self.list_events(UrgentEventFilters {
            user_id: Some(user_id.to_string()),
            upcoming: Some(true),
            ..Default::default()
        })?;
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date));
        events.truncate(limit);
        Ok(events)
    }
}

pub(crate) fn is_upcoming(event: &UrgentEventRecord, now: DateTime<Utc>) -> bool {
    event.status != EventStatus::Completed
        && parse_timestamp(&event.event_date).is_some_and(|at| at >= now)
}

fn normalize_reminder(value: Option<String>) -> AppResult<Option<String>> {
    normalize_optional_string(value)
        .map(|raw| normalize_date(&raw, "reminderTime"))
        .transpose()
}

fn normalize_contact(contact: Option<ContactInfo>) -> Option<ContactInfo> {
    contact.and_then(|info| {
        let info = ContactInfo {
            name: normalize_optional_string(info.name),
            phone: normalize_optional_string(info.phone),
            email: normalize_optional_string(info.email),
        };
        if info == ContactInfo::default() {
            None
        } else {
            Some(info)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserCreateInput;
    use crate::services::user_service::UserService;
    use tempfile::tempdir;

    fn setup_service() -> (EventService, String, tempfile::TempDir) {
        let dir = tempdir().expect("temp dir");
        let pool = DbPool::new(dir.path().join("events.sqlite")).expect("db pool");
        let user = UserService::new(pool.clone())
            .add_user(UserCreateInput {
                username: "planner".into(),
                password: "secret-pass".into(),
                email: "planner@example.com".into(),
            })
            .expect("user");
        (EventService::new(pool), user.id, dir)
    }

    fn event(
        user_id: &str,
        title: &str,
        date: &str,
        priority: Option<EventPriority>,
    ) -> UrgentEventCreateInput {
        UrgentEventCreateInput {
            title: title.into(),
            description: format!("{title} details"),
            event_date: date.into(),
            event_time: "09:30".into(),
            priority,
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let (service, user_id, _dir) = setup_service();
        let created = service
            .create_event(UrgentEventCreateInput {
                contact_info: Some(ContactInfo::default()),
                location: Some("  ".into()),
                ..event(&user_id, "Dentist", "2999-01-01", None)
            })
            .expect("create");

        assert_eq!(created.priority, EventPriority::High);
        assert_eq!(created.status, EventStatus::Upcoming);
        assert!(!created.reminder_set);
        assert!(created.location.is_none());
        assert!(created.contact_info.is_none());
        assert_eq!(service.get_event(&created.id).unwrap(), created);
    }

    #[test]
    fn create_validates_required_fields_and_owner() {
        let (service, user_id, _dir) = setup_service();
        let missing = service.create_event(UrgentEventCreateInput {
            event_time: String::new(),
            ..event(&user_id, "No time", "2999-01-01", None)
        });
        assert!(matches!(missing, Err(AppError::Validation { .. })));

        let bad_date = service.create_event(event(&user_id, "Bad", "someday", None));
        assert!(matches!(bad_date, Err(AppError::Validation { .. })));

        let ghost = service.create_event(event("ghost", "Nobody", "2999-01-01", None));
        assert!(ghost.unwrap_err().is_not_found());
    }

    #[test]
    fn listing_orders_by_priority_then_date() {
        let (service, user_id, _dir) = setup_service();
        service
            .create_event(event(
                &user_id,
                "medium-early",
                "2999-01-01",
                Some(EventPriority::Medium),
            ))
            .unwrap();
        service
            .create_event(event(&user_id, "high-late", "2999-06-01", Some(EventPriority::High)))
            .unwrap();
        service
            .create_event(event(&user_id, "high-early", "2999-02-01", Some(EventPriority::High)))
            .unwrap();
        service
            .create_event(event(&user_id, "critical", "2999-12-01", Some(EventPriority::Critical)))
            .unwrap();

        let titles: Vec<String> = service
            .list_by_user(&user_id, UrgentEventFilters::default())
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["critical", "high-early", "high-late", "medium-early"]);

        let high = service
            .list_events(UrgentEventFilters {
                priority: Some(EventPriority::High),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(high.len(), 2);
    }

    #[test]
    fn upcoming_excludes_past_and_completed() {
        let (service, user_id, _dir) = setup_service();
        service
            .create_event(event(&user_id, "past", "2000-01-01", None))
            .unwrap();
        let done = service
            .create_event(event(&user_id, "done", "2999-01-01", None))
            .unwrap();
        service
            .update_event(
                &done.id,
                UrgentEventUpdateInput {
                    status: Some(EventStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        service
            .create_event(event(&user_id, "future", "2999-03-01", Some(EventPriority::Critical)))
            .unwrap();

        let upcoming = service
            .list_by_user(
                &user_id,
                UrgentEventFilters {
                    upcoming: Some(true),
                    status: Some(EventStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "future");

        let stats = service.event_stats(&user_id).unwrap();
        assert_eq!(
            stats,
            UrgentEventStats {
                total_events: 3,
                critical_events: 1,
                upcoming_events: 1,
            }
        );
    }

    #[test]
    fn update_can_clear_optional_fields() {
        let (service, user_id, _dir) = setup_service();
        let created = service
            .create_event(UrgentEventCreateInput {
                location: Some("Clinic".into()),
                reminder_time: Some("2998-12-31T08:00:00Z".into()),
                ..event(&user_id, "Checkup", "2999-01-01", None)
            })
            .unwrap();
        assert!(created.reminder_time.is_some());

        let updated = service
            .update_event(
                &created.id,
                UrgentEventUpdateInput {
                    location: Some(None),
                    reminder_time: Some(None),
                    priority: Some(EventPriority::Critical),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.location.is_none());
        assert!(updated.reminder_time.is_none());
        assert_eq!(updated.priority, EventPriority::Critical);

        service.delete_event(&created.id).unwrap();
        assert!(service.get_event(&created.id).unwrap_err().is_not_found());
    }
}
