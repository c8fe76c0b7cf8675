//! Filter-and-select engine
//!
//! Derives the filtered view (`Valor < threshold`, projected onto the selected
//! columns) and the export view (projection only) from a table and the
//! current filter parameters.

use crate::error::{DashError, DashResult};
use crate::types::{Column, Table, VALUE_COLUMN};
use serde::Serialize;
use std::collections::HashSet;

/// Threshold text a new session starts with
pub const DEFAULT_THRESHOLD: &str = "100";

/// User-chosen parameters that survive between interactions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterParams {
    /// Columns to show and export, in display order
    pub selected_columns: Vec<String>,
    /// Threshold exactly as typed
    pub threshold_text: String,
    /// Last threshold text that parsed, used while the current text is invalid
    pub last_valid_threshold: Option<f64>,
    pub selected_city: Option<String>,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            selected_columns: Vec::new(),
            threshold_text: DEFAULT_THRESHOLD.to_string(),
            last_valid_threshold: Some(100.0),
            selected_city: None,
        }
    }
}

impl FilterParams {
    /// Threshold to filter with, plus the validation message if the current
    /// text is not a number.
    pub fn effective_threshold(&self) -> (Option<f64>, Option<String>) {
        match parse_threshold(&self.threshold_text) {
            Ok(value) => (Some(value), None),
            Err(e) => (self.last_valid_threshold, Some(e.to_string())),
        }
    }
}

/// Parse threshold text as a float
pub fn parse_threshold(text: &str) -> DashResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| DashError::Validation(format!("'{}' is not a number", text)))
}

/// Check a column selection against the table, dropping repeats (first wins)
pub fn normalize_selection(table: &Table, columns: &[String]) -> DashResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut selection = Vec::with_capacity(columns.len());

    for name in columns {
        if !table.has_column(name) {
            return Err(DashError::UnknownColumn(name.clone()));
        }
        if seen.insert(name.as_str()) {
            selection.push(name.clone());
        }
    }

    Ok(selection)
}

/// Rows whose `Valor` is strictly below `threshold`; NaN never passes
pub fn filter_below(table: &Table, threshold: f64) -> DashResult<Table> {
    let values = table
        .numbers(VALUE_COLUMN)
        .ok_or_else(|| DashError::UnknownColumn(VALUE_COLUMN.to_string()))?;

    let keep: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < threshold)
        .map(|(i, _)| i)
        .collect();

    Ok(table.select_rows(&keep))
}

/// Project onto `columns` in the given order. An empty selection keeps the
/// row count with zero columns.
pub fn project(table: &Table, columns: &[String]) -> DashResult<Table> {
    let mut projected = Table::with_height(table.row_count());
    for name in columns {
        let column = table
            .column(name)
            .ok_or_else(|| DashError::UnknownColumn(name.clone()))?;
        projected.add_column(Column::new(name.clone(), column.values.clone()));
    }
    Ok(projected)
}

/// Output of one filter pass
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Filtered and projected rows; `None` when no valid threshold exists yet
    pub view: Option<Table>,
    /// Projected rows without the value filter
    pub export: Table,
    pub threshold: Option<f64>,
    pub threshold_error: Option<String>,
}

/// Run the filter-and-select step for the current parameters
pub fn select(table: &Table, params: &FilterParams) -> DashResult<Selection> {
    let (threshold, threshold_error) = params.effective_threshold();

    let view = match threshold {
        Some(t) => Some(project(&filter_below(table, t)?, &params.selected_columns)?),
        None => None,
    };
    let export = project(table, &params.selected_columns)?;

    Ok(Selection {
        view,
        export,
        threshold,
        threshold_error,
    })
}
