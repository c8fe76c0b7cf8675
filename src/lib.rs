//! Citystats - spreadsheet dashboard for yearly values per city
//!
//! This library loads an .xlsx sheet with `cidades`, `ano` and `Valor`
//! columns, filters and projects it, computes per-city aggregates and
//! exports the projected rows as CSV.
//!
//! # Example
//!
//! ```no_run
//! use citystats::dashboard::render;
//! use citystats::filter::FilterParams;
//! use citystats::ingest::load_path;
//!
//! let table = load_path("valores.xlsx")?;
//! let params = FilterParams {
//!     selected_columns: vec!["cidades".to_string(), "Valor".to_string()],
//!     ..FilterParams::default()
//! };
//! let dashboard = render(&table, &params)?;
//!
//! for sum in &dashboard.city_sums {
//!     println!("{}: {}", sum.city, sum.total);
//! }
//! # Ok::<(), citystats::error::DashError>(())
//! ```

pub mod aggregate;
pub mod api;
pub mod chart;
pub mod cli;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod session;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{DashError, DashResult};
pub use session::{Session, SessionStore};
pub use types::{CellValue, Column, ColumnValue, Table};
