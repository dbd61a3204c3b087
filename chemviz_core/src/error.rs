use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChemvizError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("The input could not be read as CSV: {0}")]
    MalformedInput(String),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Column {column} must be numeric, but contains the value '{value}'")]
    NonNumericColumn { column: String, value: String },
    #[error("The uploaded file contains no equipment rows")]
    EmptyTable,
    #[error("Column {0} does not contain any values")]
    EmptyColumn(String),
    #[error("Could not render the report: {0}")]
    Render(#[from] lopdf::Error),
    #[error("Could not create file {path:?}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<csv::Error> for ChemvizError {
    fn from(value: csv::Error) -> Self {
        match value.into_kind() {
            csv::ErrorKind::Io(err) => Self::Io(err),
            kind => Self::MalformedInput(describe_csv_error(kind)),
        }
    }
}

/// Produces a short, user-facing description of a CSV error. The default
/// Debug output of `csv::ErrorKind` is not something we want to show people.
fn describe_csv_error(kind: csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::Utf8 { pos, err } => match pos {
            Some(pos) => format!("invalid UTF-8 on line {}: {err}", pos.line()),
            None => format!("invalid UTF-8: {err}"),
        },
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => match pos {
            Some(pos) => format!(
                "line {} has {len} fields, expected {expected_len}",
                pos.line()
            ),
            None => format!("a row has {len} fields, expected {expected_len}"),
        },
        other => format!("{other:?}"),
    }
}
