use indexmap::IndexMap;
use log::debug;
use logging_timer::time;

use crate::{
    error::ChemvizError,
    formatting::round_half_even,
    model::{Summary, Table, FLOWRATE, PRESSURE, TEMPERATURE, TYPE},
};

/// Averages are reported to this many decimal places.
pub const AVERAGE_DECIMAL_PLACES: u32 = 2;

/// Computes the summary statistics for a table. The table's rows are moved
/// into [`Summary::table_data`] unchanged.
///
/// A table with no rows is rejected with [`ChemvizError::EmptyTable`] rather
/// than reporting averages of nothing.
#[time]
pub fn aggregate(table: Table) -> Result<Summary, ChemvizError> {
    if table.is_empty() {
        return Err(ChemvizError::EmptyTable);
    }

    let avg_flowrate = column_average(&table, FLOWRATE)?;
    let avg_pressure = column_average(&table, PRESSURE)?;
    let avg_temperature = column_average(&table, TEMPERATURE)?;
    let equipment_type_distribution = type_distribution(&table);

    debug!("Equipment type distribution: {:?}", equipment_type_distribution);

    Ok(Summary {
        total_equipment: table.len(),
        avg_flowrate,
        avg_pressure,
        avg_temperature,
        equipment_type_distribution,
        table_data: table.into_rows(),
    })
}

/// The rounded mean of the numeric values in `column`. Empty cells are
/// skipped, but at least one value must be present.
fn column_average(table: &Table, column: &str) -> Result<f64, ChemvizError> {
    let (sum, count) = table
        .column_values(column)
        .filter_map(|cell| cell.as_number())
        .fold((0.0, 0_usize), |(sum, count), n| (sum + n, count + 1));

    if count == 0 {
        return Err(ChemvizError::EmptyColumn(column.to_string()));
    }

    Ok(round_half_even(sum / count as f64, AVERAGE_DECIMAL_PLACES))
}

/// Counts the rows of each equipment type, in order of first appearance. Types
/// are compared as the text in the file, so "1" and "01" are different types.
/// Rows with no type are counted under the empty string so that the counts
/// always add up to the number of rows.
fn type_distribution(table: &Table) -> IndexMap<String, usize> {
    let mut distribution = IndexMap::new();
    for cell in table.column_values(TYPE) {
        *distribution.entry(cell.to_string()).or_insert(0) += 1;
    }
    distribution
}
