pub mod bootstrap;
pub mod calendar;
pub mod config;
pub mod identity;
pub mod linkage;
