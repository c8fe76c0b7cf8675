//! CLI command handlers

pub mod commands;

pub use commands::{export, preview, summary, ExportFormat};
