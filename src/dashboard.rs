//! One full evaluation of the dashboard for a table and a set of parameters.
//!
//! [`render`] is pure: the caller reruns it after every parameter change and
//! gets the filtered view, aggregates, charts and export table back.

use crate::aggregate::{
    city_series, city_stats, sum_by_city, year_pivot, CitySum, YearPivot, YearStats,
};
use crate::chart::{city_by_year, city_comparison, BarChart};
use crate::error::DashResult;
use crate::export::to_csv_bytes;
use crate::filter::{select, FilterParams};
use crate::stats::Describe;
use crate::types::{Table, TableRecords, CITY_COLUMN};
use serde::Serialize;

/// Rows shown in the data preview
pub const PREVIEW_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub row_count: usize,
    pub columns: Vec<String>,
    pub preview: TableRecords,

    pub selected_columns: Vec<String>,
    pub threshold_text: String,
    /// Threshold actually applied (may be the last valid one)
    pub threshold: Option<f64>,
    pub threshold_error: Option<String>,
    /// `None` until a valid threshold has been entered
    pub filtered_view: Option<TableRecords>,

    pub city_sums: Vec<CitySum>,
    pub comparison_chart: BarChart,

    pub cities: Vec<String>,
    pub selected_city: Option<String>,
    pub city_stats: Describe,
    pub year_chart: BarChart,
    pub year_pivot: YearPivot,
    pub year_pivot_stats: Describe,
    pub year_pivot_by_year: Vec<YearStats>,

    pub export_rows: usize,
    /// Projected, unfiltered rows behind the CSV download
    #[serde(skip)]
    pub export: Table,
}

impl Dashboard {
    /// CSV bytes of the export table
    pub fn export_csv(&self) -> DashResult<Vec<u8>> {
        to_csv_bytes(&self.export)
    }
}

/// City to report on: the requested one if the table has it, otherwise the
/// first distinct city.
pub fn resolve_city(cities: &[String], requested: Option<&str>) -> Option<String> {
    requested
        .filter(|city| cities.iter().any(|c| c == city))
        .map(str::to_string)
        .or_else(|| cities.first().cloned())
}

/// Evaluate the whole pipeline
pub fn render(table: &Table, params: &FilterParams) -> DashResult<Dashboard> {
    let selection = select(table, params)?;

    let city_sums = sum_by_city(table)?;
    let comparison_chart = city_comparison(&city_sums);

    let cities = table.distinct_texts(CITY_COLUMN);
    let selected_city = resolve_city(&cities, params.selected_city.as_deref());
    let city = selected_city.as_deref().unwrap_or_default();

    let stats = city_stats(table, city)?;
    let year_chart = city_by_year(city, &city_series(table, city)?);
    let pivot = year_pivot(table, city)?;

    Ok(Dashboard {
        row_count: table.row_count(),
        columns: table.column_names(),
        preview: table.head(PREVIEW_ROWS).to_records(),
        selected_columns: params.selected_columns.clone(),
        threshold_text: params.threshold_text.clone(),
        threshold: selection.threshold,
        threshold_error: selection.threshold_error,
        filtered_view: selection.view.map(|v| v.to_records()),
        city_sums,
        comparison_chart,
        cities,
        selected_city,
        city_stats: stats,
        year_chart,
        year_pivot_stats: pivot.describe(),
        year_pivot_by_year: pivot.describe_by_year(),
        year_pivot: pivot,
        export_rows: selection.export.row_count(),
        export: selection.export,
    })
}
