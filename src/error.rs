use thiserror::Error;
use uuid::Uuid;

pub type DashResult<T> = Result<T, DashError>;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {row}: cannot convert '{value}' in column '{column}' to a number")]
    Coercion {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("No table loaded")]
    NoTable,

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel write error: {0}")]
    Xlsx(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse grouping of errors, used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The uploaded file could not be turned into a table.
    Parse,
    /// User input was rejected; prior state is kept.
    Validation,
    /// A session or table the request refers to does not exist.
    NotFound,
    Internal,
}

impl DashError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashError::Parse(_) | DashError::MissingColumns(_) | DashError::Coercion { .. } => {
                ErrorKind::Parse
            }
            DashError::Validation(_) | DashError::UnknownColumn(_) | DashError::UnknownCity(_) => {
                ErrorKind::Validation
            }
            DashError::NoTable | DashError::SessionNotFound(_) => ErrorKind::NotFound,
            DashError::Io(_) | DashError::Csv(_) | DashError::Xlsx(_) | DashError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        DashError::Xlsx(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_names() {
        let err = DashError::MissingColumns(vec!["ano".to_string(), "Valor".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: ano, Valor");
    }

    #[test]
    fn test_coercion_message() {
        let err = DashError::Coercion {
            row: 3,
            column: "Valor".to_string(),
            value: "1.234.56".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Row 3: cannot convert '1.234.56' in column 'Valor' to a number"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(DashError::Parse("x".into()).kind(), ErrorKind::Parse);
        assert_eq!(
            DashError::MissingColumns(vec!["ano".into()]).kind(),
            ErrorKind::Parse
        );
        assert_eq!(DashError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(DashError::UnknownCity("Z".into()).kind(), ErrorKind::Validation);
        assert_eq!(DashError::NoTable.kind(), ErrorKind::NotFound);
        assert_eq!(
            DashError::SessionNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(DashError::from(io).kind(), ErrorKind::Internal);
    }
}
