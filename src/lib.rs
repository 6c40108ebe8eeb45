pub mod config;
pub mod fetch;
pub mod grading;
pub mod infra;
pub mod output;
pub mod services;
