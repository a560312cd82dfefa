//! Provider for the cron-job.org scheduling service
//!
//! Exposes jobs, folders and status pages as declarative resources, plus
//! read-only data sources for jobs and their execution history.

pub mod cli;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod provider;
pub mod resources;
pub mod schema;
