use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// City name column
pub const CITY_COLUMN: &str = "cidades";
/// Year column, held as text after ingest
pub const YEAR_COLUMN: &str = "ano";
/// Numeric value column
pub const VALUE_COLUMN: &str = "Valor";

/// Columns every uploaded sheet must carry
pub const REQUIRED_COLUMNS: [&str; 3] = [CITY_COLUMN, YEAR_COLUMN, VALUE_COLUMN];

//==============================================================================
// Column Types
//==============================================================================

/// Column value types (homogeneous arrays)
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Array of numbers (f64, NaN for missing cells)
    Number(Vec<f64>),
    /// Array of text strings
    Text(Vec<String>),
    /// Array of booleans
    Boolean(Vec<bool>),
}

impl ColumnValue {
    /// Get the length of the array
    pub fn len(&self) -> usize {
        match self {
            ColumnValue::Number(v) => v.len(),
            ColumnValue::Text(v) => v.len(),
            ColumnValue::Boolean(v) => v.len(),
        }
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Number(_) => "Number",
            ColumnValue::Text(_) => "Text",
            ColumnValue::Boolean(_) => "Boolean",
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            ColumnValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texts(&self) -> Option<&[String]> {
        match self {
            ColumnValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Single cell at `index`. Panics if out of bounds, like slice indexing.
    pub fn cell(&self, index: usize) -> CellValue {
        match self {
            ColumnValue::Number(v) => CellValue::Number(v[index]),
            ColumnValue::Text(v) => CellValue::Text(v[index].clone()),
            ColumnValue::Boolean(v) => CellValue::Boolean(v[index]),
        }
    }

    /// New array holding the cells at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> ColumnValue {
        match self {
            ColumnValue::Number(v) => ColumnValue::Number(indices.iter().map(|&i| v[i]).collect()),
            ColumnValue::Text(v) => {
                ColumnValue::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnValue::Boolean(v) => {
                ColumnValue::Boolean(indices.iter().map(|&i| v[i]).collect())
            }
        }
    }

    /// Render every cell as text (numbers with `f64` display)
    pub fn to_texts(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.cell(i).to_string()).collect()
    }
}

/// One cell, detached from its column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.is_nan() => write!(f, "nan"),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValue,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValue) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

//==============================================================================
// Table
//==============================================================================

/// Column-oriented table with ordered columns.
///
/// The row count is stored separately so that a projection onto zero columns
/// still knows how many rows it has.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table (no columns) with a fixed number of rows
    pub fn with_height(height: usize) -> Self {
        Self {
            columns: Vec::new(),
            height,
        }
    }

    /// Add a column, replacing any column of the same name in place.
    ///
    /// The first column added to a column-less, row-less table sets its height.
    pub fn add_column(&mut self, column: Column) {
        if self.columns.is_empty() && self.height == 0 {
            self.height = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.height
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn numbers(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(|c| c.values.as_numbers())
    }

    pub fn texts(&self, name: &str) -> Option<&[String]> {
        self.column(name).and_then(|c| c.values.as_texts())
    }

    /// Validate all columns have the same length as the table
    pub fn validate_lengths(&self) -> Result<(), String> {
        for column in &self.columns {
            if column.len() != self.height {
                return Err(format!(
                    "Column '{}' has {} rows, expected {} rows",
                    column.name,
                    column.len(),
                    self.height
                ));
            }
        }
        Ok(())
    }

    /// One row as detached cells, in column order
    pub fn row(&self, index: usize) -> Vec<CellValue> {
        self.columns.iter().map(|c| c.values.cell(index)).collect()
    }

    /// New table with the rows at `indices`, all columns kept
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.select(indices)))
                .collect(),
            height: indices.len(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.height)).collect();
        self.select_rows(&indices)
    }

    /// Distinct values of a text column, in first-appearance order
    pub fn distinct_texts(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for value in self.texts(name).unwrap_or_default() {
            if seen.insert(value.as_str()) {
                distinct.push(value.clone());
            }
        }
        distinct
    }

    /// Row-major copy suitable for JSON output
    pub fn to_records(&self) -> TableRecords {
        TableRecords {
            columns: self.column_names(),
            rows: (0..self.height).map(|i| self.row(i)).collect(),
        }
    }
}

/// Serializable row-major form of a [`Table`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRecords {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}
