use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use log::info;
use logging_timer::time;

use crate::{error::ChemvizError, model::Table};

mod csv_table;

/// Reads a table from a CSV file on disk.
#[time]
pub fn read_table_from_file<P: AsRef<Path>>(input_file: P) -> Result<Table, ChemvizError> {
    let input_file = input_file.as_ref();
    info!("Reading CSV file {:?}", input_file);
    let reader = BufReader::new(File::open(input_file)?);
    read_table_from_reader(reader)
}

/// Reads a table from a slice of bytes, typically the body of an upload.
pub fn read_table_from_slice(data: &[u8]) -> Result<Table, ChemvizError> {
    read_table_from_reader(data)
}

/// Reads a table from any reader. The first record must be the header row and
/// it must contain all of the [`REQUIRED_COLUMNS`](crate::model::REQUIRED_COLUMNS).
pub fn read_table_from_reader<R: Read>(reader: R) -> Result<Table, ChemvizError> {
    csv_table::parse_csv(reader)
}
