//! HTTP API server
//!
//! Session-scoped JSON endpoints for uploading a workbook, tuning the filter
//! and reading the dashboard. Run with `citystats-server`.

pub mod handlers;
pub mod server;

pub use server::{run_api_server, ApiConfig};
