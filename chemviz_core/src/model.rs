use std::fmt::Display;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::formatting::format_number;

pub const EQUIPMENT_NAME: &str = "Equipment Name";
pub const TYPE: &str = "Type";
pub const FLOWRATE: &str = "Flowrate";
pub const PRESSURE: &str = "Pressure";
pub const TEMPERATURE: &str = "Temperature";

/// The columns every upload must have, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] = [EQUIPMENT_NAME, TYPE, FLOWRATE, PRESSURE, TEMPERATURE];

/// The required columns that identify or classify equipment. Their values are
/// kept as text even when they look like numbers.
pub const CATEGORICAL_COLUMNS: [&str; 2] = [EQUIPMENT_NAME, TYPE];

/// The required columns that are averaged and so must be numeric.
pub const NUMERIC_COLUMNS: [&str; 3] = [FLOWRATE, PRESSURE, TEMPERATURE];

/// A single value from the uploaded table. Serializes to a JSON number, string
/// or null respectively.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Empty => Ok(()),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// One row of an uploaded table, keyed by column name in header order.
/// Includes any extra columns the file had.
pub type Row = IndexMap<String, Cell>;

/// The parsed contents of an uploaded CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// The column names in the order they appeared in the header row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the value of `column` for every row. Rows that somehow lack the
    /// column yield `Cell::Empty`.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&EMPTY_CELL))
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// The statistics computed from one upload. The field names of the serialized
/// form are what HTTP clients see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_equipment: usize,
    #[serde(rename = "average_flowrate")]
    pub avg_flowrate: f64,
    #[serde(rename = "average_pressure")]
    pub avg_pressure: f64,
    #[serde(rename = "average_temperature")]
    pub avg_temperature: f64,
    /// Equipment type -> number of rows of that type, in order of first
    /// appearance.
    pub equipment_type_distribution: IndexMap<String, usize>,
    /// The uploaded rows, unchanged.
    pub table_data: Vec<Row>,
}

/// A summary as kept in the upload history.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub id: i32,
    pub filename: String,
    pub total_equipment: i64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub uploaded_at: DateTime<Utc>,
}
