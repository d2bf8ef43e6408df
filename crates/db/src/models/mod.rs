#![allow(clippy::useless_conversion)]

pub mod calendar_event;
pub mod event_link;
pub mod event_type;
pub mod ids;
pub mod kanban_task;
pub mod order;
pub mod task_type;
pub mod user;
