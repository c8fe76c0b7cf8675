//! End-to-end tests of the dashboard pipeline
//!
//! Workbooks are built in memory with rust_xlsxwriter and fed through
//! upload → parameter changes → render → CSV export.

use citystats::dashboard::render;
use citystats::error::DashError;
use citystats::filter::FilterParams;
use citystats::ingest::{load_bytes, load_path};
use citystats::session::{Session, UploadOutcome};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

/// One data row: city, year, Valor as typed in the sheet (empty = blank cell)
type Row<'a> = (&'a str, f64, &'a str);

fn workbook_bytes(rows: &[Row]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "cidades").unwrap();
    sheet.write_string(0, 1, "ano").unwrap();
    sheet.write_string(0, 2, "Valor").unwrap();
    sheet.write_string(0, 3, "fonte").unwrap();

    for (i, (city, year, value)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *city).unwrap();
        sheet.write_number(r, 1, *year).unwrap();
        if !value.is_empty() {
            sheet.write_string(r, 2, *value).unwrap();
        }
        sheet.write_string(r, 3, "IBGE").unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Scenario A: decimal-comma values for two cities
fn scenario_a() -> Vec<u8> {
    workbook_bytes(&[
        ("A", 2020.0, "50,0"),
        ("A", 2021.0, "150,0"),
        ("B", 2020.0, "30,0"),
    ])
}

/// Scenario B: a different set of cities
fn scenario_b() -> Vec<u8> {
    workbook_bytes(&[
        ("Recife", 2019.0, "10,5"),
        ("Olinda", 2019.0, "200"),
        ("Recife", 2020.0, "20,5"),
        ("Olinda", 2020.0, "5"),
    ])
}

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn loaded_session(bytes: &[u8]) -> Session {
    let mut session = Session::new();
    session.upload(Some(bytes)).unwrap();
    session
}

// ═══════════════════════════════════════════════════════════════════════════
// INGEST
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_ingest_coerces_required_columns() {
    let table = load_bytes(&scenario_a()).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_names(), names(&["cidades", "ano", "Valor", "fonte"]));
    assert_eq!(table.numbers("Valor").unwrap(), &[50.0, 150.0, 30.0]);
    assert_eq!(table.texts("ano").unwrap(), &names(&["2020", "2021", "2020"])[..]);
}

#[test]
fn test_ingest_missing_column_is_rejected() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "cidades").unwrap();
    sheet.write_string(0, 1, "Valor").unwrap();
    sheet.write_string(1, 0, "A").unwrap();
    sheet.write_number(1, 1, 1.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    match load_bytes(&bytes) {
        Err(DashError::MissingColumns(missing)) => assert_eq!(missing, names(&["ano"])),
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_ingest_unparseable_value_reports_row() {
    let bytes = workbook_bytes(&[("A", 2020.0, "1,5"), ("A", 2021.0, "1.234,56")]);

    match load_bytes(&bytes) {
        Err(DashError::Coercion { row, value, .. }) => {
            assert_eq!(row, 3);
            assert_eq!(value, "1.234,56");
        }
        other => panic!("expected Coercion error, got {:?}", other),
    }
}

#[test]
fn test_load_path_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valores.xlsx");
    std::fs::write(&path, scenario_a()).unwrap();

    assert_eq!(load_path(&path).unwrap().row_count(), 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// RENDER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_render_of_scenario_a() {
    let session = loaded_session(&scenario_a());
    let dashboard = session.render().unwrap();

    assert_eq!(dashboard.row_count, 3);
    assert_eq!(dashboard.preview.rows.len(), 3);
    assert_eq!(dashboard.threshold, Some(100.0));

    // No columns selected: the filtered view keeps its rows but has no columns
    let view = dashboard.filtered_view.unwrap();
    assert!(view.columns.is_empty());
    assert_eq!(view.rows.len(), 2);

    let sums: Vec<(String, f64)> = dashboard
        .city_sums
        .iter()
        .map(|s| (s.city.clone(), s.total))
        .collect();
    assert_eq!(sums, vec![("A".to_string(), 200.0), ("B".to_string(), 30.0)]);

    assert_eq!(dashboard.selected_city.as_deref(), Some("A"));
    assert_eq!(dashboard.city_stats.count, 2);
    assert_eq!(dashboard.city_stats.mean, 100.0);
    assert_eq!(dashboard.city_stats.min, 50.0);
    assert_eq!(dashboard.city_stats.max, 150.0);

    let years: Vec<&str> = dashboard
        .year_pivot
        .years
        .iter()
        .map(|y| y.year.as_str())
        .collect();
    assert_eq!(years, vec!["2020", "2021"]);
    let means: Vec<f64> = dashboard.year_pivot.years.iter().map(|y| y.mean).collect();
    assert_eq!(means, vec![50.0, 150.0]);
    assert_eq!(dashboard.year_pivot_stats.count, 2);
    assert_eq!(dashboard.year_pivot_stats.mean, 100.0);
}

#[test]
fn test_threshold_and_columns_shape_the_view() {
    let mut session = loaded_session(&scenario_a());
    session.select_columns(&names(&["Valor", "cidades"])).unwrap();
    session.set_threshold("40").unwrap();

    let view = session.render().unwrap().filtered_view.unwrap();
    assert_eq!(view.columns, names(&["Valor", "cidades"]));
    assert_eq!(view.rows.len(), 1);
}

#[test]
fn test_invalid_threshold_keeps_previous_filter() {
    let mut session = loaded_session(&scenario_a());
    session.set_threshold("160").unwrap();
    assert!(session.set_threshold("muito").is_err());

    let dashboard = session.render().unwrap();
    assert_eq!(dashboard.threshold_text, "muito");
    assert_eq!(dashboard.threshold, Some(160.0));
    assert!(dashboard.threshold_error.is_some());
    assert_eq!(dashboard.filtered_view.unwrap().rows.len(), 3);
}

#[test]
fn test_city_sums_cover_all_values() {
    let table = load_bytes(&scenario_b()).unwrap();
    let dashboard = render(&table, &FilterParams::default()).unwrap();

    let total: f64 = dashboard.city_sums.iter().map(|s| s.total).sum();
    let expected: f64 = table.numbers("Valor").unwrap().iter().sum();
    assert!((total - expected).abs() < 1e-9);
    // Groups are ordered by city name
    assert_eq!(dashboard.city_sums[0].city, "Olinda");
}

#[test]
fn test_unknown_city_in_params_falls_back_to_first() {
    let table = load_bytes(&scenario_b()).unwrap();
    let params = FilterParams {
        selected_city: Some("Nowhere".to_string()),
        ..FilterParams::default()
    };

    let dashboard = render(&table, &params).unwrap();
    assert_eq!(dashboard.selected_city.as_deref(), Some("Recife"));
    assert_eq!(dashboard.city_stats.count, 2);
}

#[test]
fn test_city_with_blank_values_has_empty_stats() {
    let bytes = workbook_bytes(&[("A", 2020.0, "10"), ("Z", 2020.0, "")]);
    let mut session = loaded_session(&bytes);
    session.select_city("Z").unwrap();

    let dashboard = session.render().unwrap();
    assert_eq!(dashboard.city_stats.count, 0);
    assert!(dashboard.city_stats.mean.is_nan());
}

// ═══════════════════════════════════════════════════════════════════════════
// UPLOAD LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_reupload_same_bytes_is_unchanged() {
    let bytes = scenario_a();
    let mut session = loaded_session(&bytes);
    session.set_threshold("60").unwrap();

    assert_eq!(session.upload(Some(&bytes)).unwrap(), UploadOutcome::Unchanged);
    assert_eq!(session.params().threshold_text, "60");
}

#[test]
fn test_new_upload_resets_city_and_prunes_columns() {
    let mut session = loaded_session(&scenario_a());
    session.select_columns(&names(&["cidades", "fonte"])).unwrap();
    session.select_city("B").unwrap();

    let outcome = session.upload(Some(&scenario_b())).unwrap();
    assert_eq!(outcome, UploadOutcome::Loaded { rows: 4, columns: 4 });
    assert_eq!(session.params().selected_city.as_deref(), Some("Recife"));
    assert_eq!(
        session.params().selected_columns,
        names(&["cidades", "fonte"])
    );
}

#[test]
fn test_failed_upload_keeps_previous_table() {
    let mut session = loaded_session(&scenario_a());
    assert!(session.upload(Some(b"PK\x03\x04 not really")).is_err());
    assert_eq!(session.table().unwrap().row_count(), 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_ignores_threshold_and_keeps_column_order() {
    let mut session = loaded_session(&scenario_a());
    session.select_columns(&names(&["Valor", "cidades"])).unwrap();
    session.set_threshold("0").unwrap();

    let csv = String::from_utf8(session.export_csv().unwrap()).unwrap();
    assert_eq!(csv, "Valor,cidades\n50.0,A\n150.0,A\n30.0,B\n");
}

#[test]
fn test_export_without_selection_has_one_line_per_row() {
    let session = loaded_session(&scenario_a());
    let csv = session.export_csv().unwrap();
    assert_eq!(csv, b"\n\n\n\n".to_vec());
}
