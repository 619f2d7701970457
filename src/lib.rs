pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod services;
