pub mod core;
pub mod dashboard;
pub mod lessons;
pub mod schedule;
pub mod sessions;
