pub mod auth;
pub mod core;
pub mod dashboard;
pub mod exchange;
pub mod schedule;
pub mod students;
