use crate::dashboard::Dashboard;
use crate::error::DashResult;
use crate::export::{write_csv, ExcelExporter};
use crate::ingest;
use crate::session::Session;
use crate::stats::Describe;
use crate::types::{CellValue, TableRecords};
use colored::Colorize;
use std::path::PathBuf;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    // Round to 6 decimal places for display
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

/// Print rows as a left-aligned text grid
fn print_records(records: &TableRecords) {
    if records.columns.is_empty() {
        println!("   ({} rows, no columns selected)", records.rows.len());
        return;
    }

    let cells: Vec<Vec<String>> = records
        .rows
        .iter()
        .map(|row| row.iter().map(format_cell).collect())
        .collect();

    let widths: Vec<usize> = records
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = records
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:<w$}", name, w = *w))
        .collect();
    println!("   {}", header.join("  ").bold());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect();
        println!("   {}", line.join("  "));
    }
    println!("   ({} rows)", records.rows.len());
}

/// Width of the longest bar in terminal charts
const BAR_WIDTH: f64 = 30.0;

fn text_bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let len = (value / max * BAR_WIDTH).round() as usize;
    "█".repeat(len.max(1))
}

fn print_describe(stats: &Describe) {
    if stats.is_empty() {
        println!("   {}", "No values for this selection".yellow());
        return;
    }
    for (label, value) in stats.rows() {
        println!("   {:<6} {:>14}", label, format_number(value));
    }
}

/// Execute the preview command
pub fn preview(file: PathBuf, rows: usize) -> DashResult<()> {
    println!("{}", "🏙️  Citystats - Data Preview".bold().green());
    println!("   File: {}\n", file.display());

    let table = ingest::load_path(&file)?;

    println!(
        "   {} rows, {} columns",
        table.row_count().to_string().bold(),
        table.column_count().to_string().bold()
    );
    for column in table.columns() {
        println!(
            "      {} ({})",
            column.name.cyan(),
            column.values.type_name()
        );
    }
    println!();

    print_records(&table.head(rows).to_records());
    Ok(())
}

/// Execute the summary command
pub fn summary(
    file: PathBuf,
    columns: Vec<String>,
    threshold: String,
    city: Option<String>,
) -> DashResult<()> {
    println!("{}", "🏙️  Citystats - Summary".bold().green());
    println!("   File: {}\n", file.display());

    let mut session = Session::new();
    session.replace_table(ingest::load_path(&file)?);

    if !columns.is_empty() {
        session.select_columns(&columns)?;
    }
    if let Err(e) = session.set_threshold(&threshold) {
        // Reported inline; the default threshold stays in effect
        println!("   {} {}\n", "⚠️".yellow(), e.to_string().yellow());
    }
    if let Some(ref c) = city {
        session.select_city(c)?;
    }

    let dashboard = session.render()?;
    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    match (dashboard.threshold, &dashboard.filtered_view) {
        (Some(t), Some(view)) => {
            println!(
                "{}",
                format!("📋 Rows with Valor < {}:", format_number(t))
                    .bold()
                    .cyan()
            );
            print_records(view);
        }
        _ => println!("{}", "📋 No valid threshold; filter not applied".yellow()),
    }
    println!();

    println!("{}", "📊 Valor by city:".bold().cyan());
    let max = dashboard.comparison_chart.max_value().unwrap_or(0.0);
    for bar in &dashboard.comparison_chart.bars {
        println!(
            "   {:<24} {:>14} {}",
            bar.label.bright_blue(),
            format_number(bar.value),
            text_bar(bar.value, max).green()
        );
    }
    println!();

    let city = dashboard.selected_city.as_deref().unwrap_or("-");
    println!(
        "{}",
        format!("📐 Statistics for {}:", city).bold().cyan()
    );
    print_describe(&dashboard.city_stats);
    println!();

    println!(
        "{}",
        format!("📅 Mean Valor per year for {}:", city).bold().cyan()
    );
    if dashboard.year_pivot.is_empty() {
        println!("   {}", "No values for this selection".yellow());
    }
    for year in &dashboard.year_pivot.years {
        println!("   {:<8} {:>14}", year.year, format_number(year.mean));
    }
    println!();

    println!("{}", "📐 Statistics of the per-year means:".bold().cyan());
    print_describe(&dashboard.year_pivot_stats);
    println!();
}

/// Output format of the export command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

/// Execute the export command
pub fn export(
    file: PathBuf,
    columns: Vec<String>,
    output: PathBuf,
    format: ExportFormat,
    sheet_name: String,
) -> DashResult<()> {
    println!("{}", "🏙️  Citystats - Export".bold().green());
    println!("   Input:  {}", file.display());
    println!("   Output: {}\n", output.display());

    let mut session = Session::new();
    session.replace_table(ingest::load_path(&file)?);
    session.select_columns(&columns)?;

    let dashboard = session.render()?;
    match format {
        ExportFormat::Csv => write_csv(&dashboard.export, &output)?,
        ExportFormat::Xlsx => ExcelExporter::new(&dashboard.export)
            .with_sheet_name(sheet_name)
            .export(&output)?,
    }

    println!("{}", "✅ Export Complete!".bold().green());
    println!(
        "   {} rows, {} columns written to {}",
        dashboard.export.row_count(),
        dashboard.export.column_count(),
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_text_bar_scales_to_max() {
        assert_eq!(text_bar(200.0, 200.0).chars().count(), 30);
        assert_eq!(text_bar(100.0, 200.0).chars().count(), 15);
        assert_eq!(text_bar(0.1, 200.0).chars().count(), 1);
        assert!(text_bar(-5.0, 200.0).is_empty());
        assert!(text_bar(f64::NAN, 200.0).is_empty());
        assert!(text_bar(10.0, 0.0).is_empty());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&CellValue::Number(2.50)), "2.5");
        assert_eq!(format_cell(&CellValue::Text("A".into())), "A");
        assert_eq!(format_cell(&CellValue::Boolean(true)), "true");
    }
}
