//! Spreadsheet ingest
//!
//! Reads an uploaded .xlsx workbook into a [`Table`], checks the required
//! columns and applies the two coercions (`ano` → text, `Valor` → number).

mod coerce;
mod excel;

pub use coerce::{coerce_to_number, coerce_to_text, parse_decimal_comma};
pub use excel::ExcelImporter;

use crate::error::{DashError, DashResult};
use crate::types::{Table, CITY_COLUMN, REQUIRED_COLUMNS, VALUE_COLUMN, YEAR_COLUMN};
use std::path::Path;
use tracing::info;

/// Load a table from uploaded bytes. `None` (nothing uploaded) yields `Ok(None)`.
pub fn load_upload(upload: Option<&[u8]>) -> DashResult<Option<Table>> {
    upload.map(load_bytes).transpose()
}

/// Load and coerce a table from workbook bytes
pub fn load_bytes(bytes: &[u8]) -> DashResult<Table> {
    let table = ExcelImporter::from_bytes(bytes).import()?;
    prepare(table)
}

/// Load and coerce a table from a workbook on disk
pub fn load_path<P: AsRef<Path>>(path: P) -> DashResult<Table> {
    let table = ExcelImporter::from_path(path)?.import()?;
    prepare(table)
}

/// Fail with [`DashError::MissingColumns`] unless all required columns exist
pub fn require_columns(table: &Table) -> DashResult<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashError::MissingColumns(missing))
    }
}

fn prepare(mut table: Table) -> DashResult<Table> {
    table.validate_lengths().map_err(DashError::Parse)?;
    require_columns(&table)?;
    coerce_to_text(&mut table, CITY_COLUMN)?;
    coerce_to_text(&mut table, YEAR_COLUMN)?;
    coerce_to_number(&mut table, VALUE_COLUMN)?;

    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        "table loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnValue};

    #[test]
    fn test_load_upload_none_is_empty_result() {
        assert!(load_upload(None).unwrap().is_none());
    }

    #[test]
    fn test_load_upload_garbage_is_parse_error() {
        let err = load_upload(Some(b"garbage")).unwrap_err();
        assert!(matches!(err, DashError::Parse(_)));
    }

    #[test]
    fn test_require_columns_lists_all_missing() {
        let mut table = Table::new();
        table.add_column(Column::new(
            CITY_COLUMN,
            ColumnValue::Text(vec!["A".into()]),
        ));
        match require_columns(&table).unwrap_err() {
            DashError::MissingColumns(names) => assert_eq!(names, vec!["ano", "Valor"]),
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }
}
