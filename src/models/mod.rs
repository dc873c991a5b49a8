pub mod analytics;
pub mod dashboard;
pub mod event;
pub mod health;
pub mod note;
pub mod task;
pub mod user;
