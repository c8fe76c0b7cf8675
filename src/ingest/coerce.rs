//! In-place column coercions applied right after import

use crate::error::{DashError, DashResult};
use crate::types::{Column, ColumnValue, Table};

/// Parse a number written with a decimal comma.
///
/// Every `,` is replaced with `.` and the result parsed as-is. There is no
/// thousands-separator handling: `"1.234,56"` becomes `"1.234.56"` and fails.
pub fn parse_decimal_comma(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// Rewrite a column as text. Numbers use `f64` display, so `2020.0` → `"2020"`.
pub fn coerce_to_text(table: &mut Table, name: &str) -> DashResult<()> {
    let column = table
        .column(name)
        .ok_or_else(|| DashError::UnknownColumn(name.to_string()))?;

    if let ColumnValue::Text(_) = column.values {
        return Ok(());
    }

    let texts = column.values.to_texts();
    table.add_column(Column::new(name, ColumnValue::Text(texts)));
    Ok(())
}

/// Rewrite a column as numbers using [`parse_decimal_comma`].
///
/// Blank text cells become NaN. Any other cell that does not parse to a
/// finite number aborts with [`DashError::Coercion`], reporting the
/// spreadsheet row (header is row 1).
pub fn coerce_to_number(table: &mut Table, name: &str) -> DashResult<()> {
    let column = table
        .column(name)
        .ok_or_else(|| DashError::UnknownColumn(name.to_string()))?;

    let numbers: Vec<f64> = match &column.values {
        ColumnValue::Number(_) => return Ok(()),
        ColumnValue::Boolean(bools) => bools
            .iter()
            .map(|&b| if b { 1.0 } else { 0.0 })
            .collect(),
        ColumnValue::Text(texts) => texts
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                if text.trim().is_empty() {
                    return Ok(f64::NAN);
                }
                match parse_decimal_comma(text) {
                    Some(n) if n.is_finite() => Ok(n),
                    _ => Err(DashError::Coercion {
                        row: idx + 2,
                        column: name.to_string(),
                        value: text.clone(),
                    }),
                }
            })
            .collect::<DashResult<Vec<f64>>>()?,
    };

    table.add_column(Column::new(name, ColumnValue::Number(numbers)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(name: &str, values: ColumnValue) -> Table {
        let mut table = Table::new();
        table.add_column(Column::new(name, values));
        table
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal_comma("50,0"), Some(50.0));
        assert_eq!(parse_decimal_comma(" 150,25 "), Some(150.25));
        assert_eq!(parse_decimal_comma("30.5"), Some(30.5));
        assert_eq!(parse_decimal_comma("42"), Some(42.0));
    }

    #[test]
    fn test_parse_decimal_comma_is_not_locale_aware() {
        // Thousands separators are not understood
        assert_eq!(parse_decimal_comma("1.234,56"), None);
        assert_eq!(parse_decimal_comma("1,234,56"), None);
        assert_eq!(parse_decimal_comma("abc"), None);
    }

    #[test]
    fn test_coerce_to_text_from_numbers() {
        let mut table = table_with("ano", ColumnValue::Number(vec![2020.0, 2021.0, f64::NAN]));
        coerce_to_text(&mut table, "ano").unwrap();
        assert_eq!(table.texts("ano").unwrap(), &["2020", "2021", "nan"]);
    }

    #[test]
    fn test_coerce_to_number_from_text() {
        let mut table = table_with(
            "Valor",
            ColumnValue::Text(vec!["50,0".into(), "30.5".into(), "".into()]),
        );
        coerce_to_number(&mut table, "Valor").unwrap();
        let values = table.numbers("Valor").unwrap();
        assert_eq!(values[0], 50.0);
        assert_eq!(values[1], 30.5);
        assert!(values[2].is_nan());
    }

    #[test]
    fn test_coerce_to_number_reports_row() {
        let mut table = table_with(
            "Valor",
            ColumnValue::Text(vec!["1,0".into(), "1.234,56".into()]),
        );
        let err = coerce_to_number(&mut table, "Valor").unwrap_err();
        match err {
            DashError::Coercion { row, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(value, "1.234,56");
            }
            other => panic!("Expected Coercion, got {:?}", other),
        }
        // Table is untouched on failure
        assert!(table.texts("Valor").is_some());
    }

    #[test]
    fn test_coerce_to_number_rejects_infinite() {
        let mut table = table_with("Valor", ColumnValue::Text(vec!["inf".into()]));
        assert!(coerce_to_number(&mut table, "Valor").is_err());
    }

    #[test]
    fn test_coerce_unknown_column() {
        let mut table = Table::new();
        assert!(matches!(
            coerce_to_text(&mut table, "ano"),
            Err(DashError::UnknownColumn(_))
        ));
    }
}
