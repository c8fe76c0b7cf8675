//! Excel importer implementation - Excel (.xlsx) → Table

use crate::error::{DashError, DashResult};
use crate::types::{Column, ColumnValue, Table};
use calamine::{Data, Range, Reader, Xlsx};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Excel importer reading the first worksheet of an .xlsx workbook
pub struct ExcelImporter {
    bytes: Vec<u8>,
}

impl ExcelImporter {
    /// Create an importer over an uploaded byte stream
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Create an importer over a file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> DashResult<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    /// Import the first worksheet as an uncoerced Table
    pub fn import(&self) -> DashResult<Table> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| DashError::Parse(format!("Failed to open Excel file: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DashError::Parse("Workbook has no worksheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            DashError::Parse(format!("Failed to read worksheet '{}': {}", sheet_name, e))
        })?;

        debug!(sheet = %sheet_name, size = ?range.get_size(), "read worksheet");
        self.process_sheet(&sheet_name, &range)
    }

    fn process_sheet(&self, sheet_name: &str, range: &Range<Data>) -> DashResult<Table> {
        if range.is_empty() {
            return Err(DashError::Parse(format!(
                "Worksheet '{}' is empty",
                sheet_name
            )));
        }

        let (height, width) = range.get_size();
        let column_names = self.header_names(range, width);

        // Collect all data (skip header row)
        let mut columns_data: Vec<Vec<Data>> = vec![Vec::with_capacity(height - 1); width];
        for row in 1..height {
            for (col, data) in columns_data.iter_mut().enumerate() {
                data.push(range.get((row, col)).cloned().unwrap_or(Data::Empty));
            }
        }

        let mut table = Table::with_height(height - 1);
        for (name, data) in column_names.into_iter().zip(columns_data) {
            table.add_column(Column::new(name, self.convert_to_column_value(&data)));
        }

        if table.column_count() != width {
            return Err(DashError::Parse(format!(
                "Worksheet '{}' has {} columns but only {} distinct headers",
                sheet_name,
                width,
                table.column_count()
            )));
        }
        Ok(table)
    }

    /// Header row names. Blank headers become `Unnamed: N`; repeated names get
    /// a `.1`, `.2`, ... suffix, bumped past any name already taken, so
    /// `x, x, x.1` reads as `x, x.1, x.1.1`.
    fn header_names(&self, range: &Range<Data>, width: usize) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::with_capacity(width);
        let mut suffixes: HashMap<String, usize> = HashMap::new();
        let mut names = Vec::with_capacity(width);

        for col in 0..width {
            let base = match range.get((0, col)) {
                Some(Data::Empty) | None => format!("Unnamed: {}", col),
                Some(cell) => cell_text(cell),
            };

            let mut name = base.clone();
            if used.contains(&name) {
                let suffix = suffixes.entry(base.clone()).or_insert(0);
                loop {
                    *suffix += 1;
                    name = format!("{}.{}", base, suffix);
                    if !used.contains(&name) {
                        break;
                    }
                }
            }

            used.insert(name.clone());
            names.push(name);
        }

        names
    }

    /// Convert Excel Data array to ColumnValue.
    ///
    /// A column is numeric (or boolean) only if every non-empty cell is;
    /// anything mixed falls back to text so later coercion sees the raw cells.
    fn convert_to_column_value(&self, data: &[Data]) -> ColumnValue {
        let mut filled = data.iter().filter(|cell| !matches!(cell, Data::Empty)).peekable();

        if filled.peek().is_none()
            || filled.all(|cell| matches!(cell, Data::Float(_) | Data::Int(_)))
        {
            let numbers = data
                .iter()
                .map(|cell| match cell {
                    Data::Float(f) => *f,
                    Data::Int(i) => *i as f64,
                    _ => f64::NAN,
                })
                .collect();
            return ColumnValue::Number(numbers);
        }

        if data
            .iter()
            .all(|cell| matches!(cell, Data::Bool(_) | Data::Empty))
        {
            let bools = data
                .iter()
                .map(|cell| matches!(cell, Data::Bool(true)))
                .collect();
            return ColumnValue::Boolean(bools);
        }

        ColumnValue::Text(data.iter().map(cell_text).collect())
    }
}

/// Text form of a single cell
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
