pub mod metrics;
pub mod models;
pub mod recommendations;
pub mod schedule;
