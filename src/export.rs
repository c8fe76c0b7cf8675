//! Export of the column-projected table (CSV download, optional .xlsx)

use crate::error::DashResult;
use crate::types::{ColumnValue, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// File name offered for the CSV download
pub const EXPORT_FILE_NAME: &str = "filtered_data.csv";

/// MIME type of the CSV download
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Encode a table as UTF-8 CSV: comma-delimited, header row, no index.
/// NaN is written as an empty field.
pub fn to_csv_bytes(table: &Table) -> DashResult<Vec<u8>> {
    // A zero-column projection still has a (blank) header line, like a
    // zero-column frame does, followed by one empty line per row.
    if table.column_count() == 0 {
        let mut out = b"\n".to_vec();
        out.extend(std::iter::repeat(b'\n').take(table.row_count()));
        return Ok(out);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| csv_field(&column.values, row))
            .collect();
        writer.write_record(&record)?;
    }

    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write the CSV encoding of `table` to `path`
pub fn write_csv(table: &Table, path: &Path) -> DashResult<()> {
    std::fs::write(path, to_csv_bytes(table)?)?;
    Ok(())
}

/// Floats keep a fractional part (`50.0`, not `50`) so a numeric column reads
/// back as floats.
fn csv_field(values: &ColumnValue, row: usize) -> String {
    match values {
        ColumnValue::Number(v) if v[row].is_nan() => String::new(),
        ColumnValue::Number(v) => format!("{:?}", v[row]),
        other => other.cell(row).to_string(),
    }
}

/// Worksheet name used by [`ExcelExporter`] unless overridden
pub const DEFAULT_SHEET_NAME: &str = "filtered_data";

/// Excel exporter writing one table to a single worksheet
pub struct ExcelExporter<'a> {
    table: &'a Table,
    sheet_name: String,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Export the table to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> DashResult<()> {
        let mut workbook = self.build()?;
        workbook.save(output_path)?;
        Ok(())
    }

    fn build(&self) -> DashResult<Workbook> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        let header = Format::new().set_bold();
        for (col_idx, name) in self.table.column_names().iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, name, &header)?;
        }

        for (col_idx, column) in self.table.columns().iter().enumerate() {
            for row_idx in 0..self.table.row_count() {
                // Row 0 is the header
                Self::write_cell_value(
                    worksheet,
                    (row_idx + 1) as u32,
                    col_idx as u16,
                    &column.values,
                    row_idx,
                )?;
            }
        }

        Ok(workbook)
    }

    fn write_cell_value(
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        values: &ColumnValue,
        index: usize,
    ) -> DashResult<()> {
        match values {
            ColumnValue::Number(v) => {
                // Missing values stay blank
                if !v[index].is_nan() {
                    worksheet.write_number(row, col, v[index])?;
                }
            }
            ColumnValue::Text(v) => {
                worksheet.write_string(row, col, &v[index])?;
            }
            ColumnValue::Boolean(v) => {
                worksheet.write_boolean(row, col, v[index])?;
            }
        }
        Ok(())
    }
}
