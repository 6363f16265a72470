use thiserror::Error;

/// Result type for statement dispatch.
pub type DbResult<T> = Result<T, DbError>;

/// A row handed to [crate::Table::add_row] lacks one or more declared columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row for table {table:?} is missing columns {missing:?}")]
pub struct RowShapeError {
    /// The table that rejected the row.
    pub table: String,
    /// Declared columns absent from the row, in declared order.
    pub missing: Vec<String>,
}

/// Errors surfaced to the caller of [crate::Database::execute].
///
/// Absent keys are never an error: lookups and deletes on a missing key are
/// silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    #[error("empty statement")]
    EmptyStatement,

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("invalid {statement} syntax: {reason}")]
    Syntax {
        statement: &'static str,
        reason: String,
    },

    #[error("no such table: {0}")]
    NoSuchTable(String),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("column count doesn't match value count: expected {expected}, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("no such column {column:?} in table {table:?}")]
    NoSuchColumn { table: String, column: String },

    #[error(transparent)]
    RowShape(#[from] RowShapeError),

    #[error("unknown store kind {0:?}, expected one of chaining, linear, quadratic, double")]
    UnknownStoreKind(String),
}

impl DbError {
    pub(crate) fn syntax(statement: &'static str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            statement,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_shape_error_converts_into_db_error() {
        let err: DbError = RowShapeError {
            table: "student".into(),
            missing: vec!["age".into()],
        }
        .into();

        assert!(matches!(err, DbError::RowShape(_)));
        assert_eq!(
            err.to_string(),
            r#"row for table "student" is missing columns ["age"]"#
        );
    }

    #[test]
    fn test_syntax_message() {
        let err = DbError::syntax("SELECT", "expected FROM");
        assert_eq!(err.to_string(), "invalid SELECT syntax: expected FROM");
    }
}
