pub mod aggregation;
pub mod classify;
pub mod config;
pub mod grades;
pub mod loader;
pub mod output;
pub mod records;
pub mod subjects;
