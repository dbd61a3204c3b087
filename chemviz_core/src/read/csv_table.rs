use std::{collections::HashMap, io::Read};

use csv::{ReaderBuilder, StringRecord};
use log::debug;

use crate::{
    error::ChemvizError,
    model::{Cell, Row, Table, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS, REQUIRED_COLUMNS},
};

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Table, ChemvizError> {
    // Flexible, because short rows are allowed (they are padded with empty
    // cells). Long rows are rejected below with a better message than the
    // csv crate gives.
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = read_header(&mut csv_reader)?;
    check_required_columns(&columns)?;

    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.len() > columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(ChemvizError::MalformedInput(format!(
                "line {line} has {} fields, expected {}",
                record.len(),
                columns.len()
            )));
        }
        records.push(record);
    }

    let numeric: Vec<bool> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            !CATEGORICAL_COLUMNS.contains(&name.as_str()) && is_numeric_column(&records, idx)
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| build_row(&columns, &numeric, record))
        .collect();

    let table = Table::new(columns, rows);
    check_numeric_columns(&table)?;
    debug!(
        "Parsed CSV with {} rows and columns {:?}",
        table.len(),
        table.columns()
    );
    Ok(table)
}

fn read_header<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<Vec<String>, ChemvizError> {
    let headers = csv_reader.headers()?;
    if headers.iter().all(str::is_empty) {
        return Err(ChemvizError::MalformedInput(
            "the file has no header row".to_string(),
        ));
    }

    let names = headers.iter().enumerate().map(|(idx, name)| {
        if idx == 0 {
            name.trim_start_matches('\u{feff}')
        } else {
            name
        }
    });

    Ok(disambiguate_columns(names))
}

/// Gives every column a unique, non-blank name. Blank names become
/// "Unnamed: <index>" and repeated names get a ".1", ".2"... suffix, so the
/// header `Note,Note,,` reads as `Note`, `Note.1`, `Unnamed: 2`, `Unnamed: 3`.
/// The first occurrence of a name always keeps it.
fn disambiguate_columns<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for (idx, original) in names.enumerate() {
        let mut name = if original.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            original.to_string()
        };

        let mut count = counts.get(&name).copied().unwrap_or_default();
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{name}.{count}");
            count = counts.get(&name).copied().unwrap_or_default();
        }

        if name != original {
            debug!("Column {idx} ({original:?}) renamed to {name:?}");
        }
        counts.insert(name.clone(), count + 1);
        columns.push(name);
    }

    columns
}

/// Reports the first required column that is missing. The order of
/// [`REQUIRED_COLUMNS`] decides which one that is.
fn check_required_columns(columns: &[String]) -> Result<(), ChemvizError> {
    match REQUIRED_COLUMNS
        .iter()
        .find(|required| !columns.iter().any(|c| c == *required))
    {
        Some(missing) => Err(ChemvizError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

/// A column is numeric if every non-empty value in it is a finite number.
fn is_numeric_column(records: &[StringRecord], idx: usize) -> bool {
    records
        .iter()
        .filter_map(|record| record.get(idx))
        .filter(|value| !value.is_empty())
        .all(|value| parse_number(value).is_some())
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn build_row(columns: &[String], numeric: &[bool], record: &StringRecord) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let value = record.get(idx).unwrap_or_default();
            let cell = if value.is_empty() {
                Cell::Empty
            } else {
                match (numeric[idx], parse_number(value)) {
                    (true, Some(n)) => Cell::Number(n),
                    _ => Cell::Text(value.to_string()),
                }
            };
            (name.clone(), cell)
        })
        .collect()
}

fn check_numeric_columns(table: &Table) -> Result<(), ChemvizError> {
    for column in NUMERIC_COLUMNS {
        // Once a column holds one non-number, all of its cells are text, so
        // look for the first one that does not parse.
        let offending = table.column_values(column).find_map(|cell| match cell {
            Cell::Text(value) if parse_number(value).is_none() => Some(value.clone()),
            _ => None,
        });

        if let Some(value) = offending {
            return Err(ChemvizError::NonNumericColumn {
                column: column.to_string(),
                value,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SAMPLE_CSV;

    fn parse(s: &str) -> Result<Table, ChemvizError> {
        parse_csv(s.as_bytes())
    }

    #[test]
    fn valid_table() {
        let table = parse(SAMPLE_CSV).unwrap();
        assert_eq!(
            table.columns(),
            ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"]
        );
        assert_eq!(table.len(), 3);

        let first = &table.rows()[0];
        assert_eq!(first["Equipment Name"], Cell::Text("Pump-1".to_string()));
        assert_eq!(first["Type"], Cell::Text("Pump".to_string()));
        assert_eq!(first["Flowrate"], Cell::Number(10.0));
        assert_eq!(first["Pressure"], Cell::Number(5.5));
        assert_eq!(first["Temperature"], Cell::Number(80.0));
    }

    #[test]
    fn missing_pressure() {
        let result = parse(
            "Equipment Name,Type,Flowrate,Temperature\n\
             Pump-1,Pump,not-a-number,80\n",
        );
        match result {
            Err(ChemvizError::MissingColumn(column)) => assert_eq!(column, "Pressure"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn first_missing_column_is_reported() {
        let result = parse("Equipment Name,Flowrate,Pressure\nPump-1,10,5\n");
        match result {
            Err(ChemvizError::MissingColumn(column)) => assert_eq!(column, "Type"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn extra_columns_are_kept_in_header_order() {
        let table = parse(
            "Site,Equipment Name,Type,Flowrate,Pressure,Temperature,Capacity\n\
             North,Pump-1,Pump,10,5,80,200\n",
        )
        .unwrap();

        let row = &table.rows()[0];
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["Site", "Equipment Name", "Type", "Flowrate", "Pressure", "Temperature", "Capacity"]
        );
        assert_eq!(row["Site"], Cell::Text("North".to_string()));
        assert_eq!(row["Capacity"], Cell::Number(200.0));
    }

    #[test]
    fn mixed_extra_column_stays_text() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature,Tag\n\
             Pump-1,Pump,10,5,80,17\n\
             Pump-2,Pump,10,5,80,A17\n",
        )
        .unwrap();

        assert_eq!(table.rows()[0]["Tag"], Cell::Text("17".to_string()));
        assert_eq!(table.rows()[1]["Tag"], Cell::Text("A17".to_string()));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature,Notes\n\
             Pump-1,Pump,10,5,80\n",
        )
        .unwrap();

        assert_eq!(table.rows()[0]["Notes"], Cell::Empty);
    }

    #[test]
    fn empty_cells_in_numeric_columns() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,,5,80\n\
             Pump-2,Pump,12,5,80\n",
        )
        .unwrap();

        assert_eq!(table.rows()[0]["Flowrate"], Cell::Empty);
        assert_eq!(table.rows()[1]["Flowrate"], Cell::Number(12.0));
    }

    #[test]
    fn header_only_gives_empty_table() {
        let table = parse("Equipment Name,Type,Flowrate,Pressure,Temperature\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn empty_input() {
        let result = parse("");
        assert!(matches!(result, Err(ChemvizError::MalformedInput(_))));
    }

    #[test]
    fn too_many_fields() {
        let result = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,10,5,80,surplus\n",
        );
        assert!(matches!(result, Err(ChemvizError::MalformedInput(_))));
    }

    #[test]
    fn invalid_utf8() {
        let mut data = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nPump".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b",Pump,10,5,80\n");
        let result = parse_csv(data.as_slice());
        assert!(matches!(result, Err(ChemvizError::MalformedInput(_))));
    }

    #[test]
    fn duplicated_header_names_get_a_suffix() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature,Note,Note,Note\n\
             Pump-1,Pump,10,5,80,a,b,c\n",
        )
        .unwrap();

        assert_eq!(&table.columns()[5..], ["Note", "Note.1", "Note.2"]);
        let row = &table.rows()[0];
        assert_eq!(row["Note"], Cell::Text("a".to_string()));
        assert_eq!(row["Note.1"], Cell::Text("b".to_string()));
        assert_eq!(row["Note.2"], Cell::Text("c".to_string()));
    }

    #[test]
    fn duplicated_required_column_keeps_the_first() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature,Type\n\
             Pump-1,Pump,10,5,80,Spare\n",
        )
        .unwrap();

        let row = &table.rows()[0];
        assert_eq!(row["Type"], Cell::Text("Pump".to_string()));
        assert_eq!(row["Type.1"], Cell::Text("Spare".to_string()));
    }

    #[test]
    fn trailing_commas_give_unnamed_columns() {
        // What a spreadsheet export with trailing empty columns looks like.
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature,,\n\
             Pump-1,Pump,10,5,80,,\n\
             Pump-2,Pump,12,5,80,,\n",
        )
        .unwrap();

        assert_eq!(&table.columns()[5..], ["Unnamed: 5", "Unnamed: 6"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1]["Unnamed: 6"], Cell::Empty);
    }

    #[test]
    fn generated_names_do_not_clash_with_real_ones() {
        let columns = disambiguate_columns(["A", "A.1", "A", ""].into_iter());
        assert_eq!(columns, ["A", "A.1", "A.2", "Unnamed: 3"]);
    }

    #[test]
    fn categorical_columns_stay_text() {
        let table = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             101,1,10,5,80\n\
             102,2,10,5,80\n\
             103,01,10,5,80\n",
        )
        .unwrap();

        let row = &table.rows()[2];
        assert_eq!(row["Equipment Name"], Cell::Text("103".to_string()));
        assert_eq!(row["Type"], Cell::Text("01".to_string()));
    }

    #[test]
    fn non_numeric_flowrate() {
        let result = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,10,5,80\n\
             Pump-2,Pump,fast,5,80\n",
        );
        match result {
            Err(ChemvizError::NonNumericColumn { column, value }) => {
                assert_eq!(column, "Flowrate");
                assert_eq!(value, "fast");
            }
            other => panic!("expected NonNumericColumn, got {other:?}"),
        }
    }

    #[test]
    fn first_offending_value_is_reported() {
        let result = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,10,5,80\n\
             Pump-2,Pump,12,5,80\n\
             Pump-3,Pump,slow,5,80\n\
             Pump-4,Pump,fast,5,80\n",
        );
        match result {
            Err(ChemvizError::NonNumericColumn { value, .. }) => assert_eq!(value, "slow"),
            other => panic!("expected NonNumericColumn, got {other:?}"),
        }
    }

    #[test]
    fn infinite_values_are_not_numbers() {
        let result = parse(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,inf,5,80\n",
        );
        assert!(matches!(
            result,
            Err(ChemvizError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn leading_bom_is_ignored() {
        let table = parse(
            "\u{feff}Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump-1,Pump,10,5,80\n",
        )
        .unwrap();
        assert_eq!(table.columns()[0], "Equipment Name");
    }
}
