use std::{fs::File, path::Path};

use log::info;
use logging_timer::time;
use rust_xlsxwriter::{Chart, ChartType, ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

use crate::{
    error::ChemvizError,
    model::{Cell, Summary},
};

const SUMMARY_SHEET: &str = "Summary";
const DATA_SHEET: &str = "Data";

/// The distribution table starts on this row of the summary sheet, below the
/// averages.
const DISTRIBUTION_FIRST_ROW: u32 = 7;

/// Builds a workbook for one upload. The "Summary" sheet holds the averages,
/// the equipment type distribution and a column chart of it. The "Data" sheet
/// echoes the uploaded rows.
#[time]
pub fn create_summary_xlsx(filename: &str, summary: &Summary) -> Result<Workbook, ChemvizError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    write_summary_sheet(sheet, &bold, filename, summary)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    write_data_sheet(sheet, &bold, summary)?;

    Ok(workbook)
}

pub fn write_summary_to_file<P: AsRef<Path>>(
    output_file: P,
    mut workbook: Workbook,
) -> Result<(), ChemvizError> {
    let output_file = output_file.as_ref();
    let mut file = File::create(output_file).map_err(|source| ChemvizError::CreateFile {
        path: output_file.to_path_buf(),
        source,
    })?;
    workbook.save_to_writer(&mut file)?;
    info!("Wrote summary workbook {:?}", output_file);
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    bold: &Format,
    filename: &str,
    summary: &Summary,
) -> Result<(), XlsxError> {
    sheet.write_string_with_format(0, 0, "Filename", bold)?;
    sheet.write_string(0, 1, filename)?;
    sheet.write_string_with_format(1, 0, "Total Equipment", bold)?;
    sheet.write_number(1, 1, summary.total_equipment as f64)?;
    sheet.write_string_with_format(2, 0, "Average Flowrate", bold)?;
    sheet.write_number(2, 1, summary.avg_flowrate)?;
    sheet.write_string_with_format(3, 0, "Average Pressure", bold)?;
    sheet.write_number(3, 1, summary.avg_pressure)?;
    sheet.write_string_with_format(4, 0, "Average Temperature", bold)?;
    sheet.write_number(4, 1, summary.avg_temperature)?;

    let header_row = DISTRIBUTION_FIRST_ROW - 1;
    sheet.write_string_with_format(header_row, 0, "Equipment Type", bold)?;
    sheet.write_string_with_format(header_row, 1, "Count", bold)?;

    let mut row = DISTRIBUTION_FIRST_ROW;
    for (equipment_type, count) in &summary.equipment_type_distribution {
        sheet.write_string(row, 0, equipment_type)?;
        sheet.write_number(row, 1, *count as f64)?;
        row += 1;
    }
    sheet.set_column_width(0, 22)?;

    if row > DISTRIBUTION_FIRST_ROW {
        let last_row = row - 1;
        let mut chart = Chart::new(ChartType::Column);
        chart
            .add_series()
            .set_categories((SUMMARY_SHEET, DISTRIBUTION_FIRST_ROW, 0, last_row, 0))
            .set_values((SUMMARY_SHEET, DISTRIBUTION_FIRST_ROW, 1, last_row, 1));
        chart.title().set_name("Equipment Type Distribution");
        chart.x_axis().set_name("Equipment Type");
        chart.y_axis().set_name("Count");
        chart.legend().set_hidden();
        sheet.insert_chart(0, 3, &chart)?;
    }

    Ok(())
}

fn write_data_sheet(
    sheet: &mut Worksheet,
    bold: &Format,
    summary: &Summary,
) -> Result<(), XlsxError> {
    let Some(first) = summary.table_data.first() else {
        return Ok(());
    };

    for (col, name) in first.keys().enumerate() {
        sheet.write_string_with_format(0, to_col(col)?, name, bold)?;
    }

    for (idx, data_row) in summary.table_data.iter().enumerate() {
        // Row 0 is the header.
        let row = RowNum::try_from(idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in data_row.values().enumerate() {
            let col = to_col(col)?;
            match cell {
                Cell::Number(n) => sheet.write_number(row, col, *n)?,
                Cell::Text(s) => sheet.write_string(row, col, s)?,
                Cell::Empty => continue,
            };
        }
    }

    sheet.autofit();
    Ok(())
}

fn to_col(col: usize) -> Result<ColNum, XlsxError> {
    ColNum::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::aggregate,
        fixtures::SAMPLE_CSV,
        model::Row,
        read::read_table_from_slice,
    };

    fn sample_summary() -> Summary {
        let table = read_table_from_slice(SAMPLE_CSV.as_bytes()).unwrap();
        aggregate(table).unwrap()
    }

    #[test]
    fn workbook_can_be_saved() {
        let mut workbook = create_summary_xlsx("sample.csv", &sample_summary()).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        // An xlsx file is a zip archive.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn too_many_columns_is_an_error() {
        // More columns than either a worksheet or a u16 can address.
        let row: Row = (0..70_000)
            .map(|idx| (format!("Column {idx}"), Cell::Number(1.0)))
            .collect();
        let summary = Summary {
            table_data: vec![row],
            ..sample_summary()
        };

        let result = create_summary_xlsx("wide.csv", &summary);
        assert!(matches!(
            result,
            Err(ChemvizError::Xlsx(XlsxError::RowColumnLimitError))
        ));
    }

    #[test]
    fn unwritable_output_names_the_file() {
        let workbook = create_summary_xlsx("sample.csv", &sample_summary()).unwrap();
        let output_file = std::env::temp_dir()
            .join("chemviz-no-such-directory")
            .join("summary.xlsx");

        match write_summary_to_file(&output_file, workbook) {
            Err(ChemvizError::CreateFile { path, .. }) => assert_eq!(path, output_file),
            other => panic!("expected CreateFile, got {other:?}"),
        }
    }
}
