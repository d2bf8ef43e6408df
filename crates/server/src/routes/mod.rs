pub mod auth;
pub mod calendar;
pub mod event_links;
pub mod event_types;
pub mod health;
pub mod kanban;
pub mod orders;
pub mod task_types;
pub mod users;
