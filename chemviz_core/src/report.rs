use std::path::Path;

use log::info;
use logging_timer::time;
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, ObjectId, Stream,
};

use crate::{
    error::ChemvizError,
    formatting::format_number,
    model::{Summary, UploadRecord},
};

pub const REPORT_TITLE: &str = "Equipment Analysis Report";

/// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

const LEFT_MARGIN: i64 = 50;
const TITLE_Y: i64 = 800;
const TITLE_SIZE: i64 = 16;
const FIRST_LINE_Y: i64 = 760;
const LINE_SPACING: i64 = 20;
const BODY_SIZE: i64 = 12;

/// The values that appear on a report, already formatted.
struct ReportFields {
    filename: String,
    total_equipment: String,
    avg_flowrate: f64,
    avg_pressure: f64,
    avg_temperature: f64,
}

impl ReportFields {
    fn lines(&self) -> [String; 5] {
        [
            format!("Filename: {}", self.filename),
            format!("Total Equipment: {}", self.total_equipment),
            format!("Average Flowrate: {}", format_number(self.avg_flowrate)),
            format!("Average Pressure: {}", format_number(self.avg_pressure)),
            format!("Average Temperature: {}", format_number(self.avg_temperature)),
        ]
    }
}

impl From<&UploadRecord> for ReportFields {
    fn from(record: &UploadRecord) -> Self {
        Self {
            filename: record.filename.clone(),
            total_equipment: record.total_equipment.to_string(),
            avg_flowrate: record.avg_flowrate,
            avg_pressure: record.avg_pressure,
            avg_temperature: record.avg_temperature,
        }
    }
}

/// Renders the single-page PDF report for a record from the upload history.
/// The output depends only on the record, so rendering the same record twice
/// gives identical bytes.
#[time]
pub fn render_report(record: &UploadRecord) -> Result<Vec<u8>, ChemvizError> {
    info!("Rendering report for record {} ({})", record.id, record.filename);
    render(&ReportFields::from(record))
}

/// Renders the same report for a summary that has not been saved, as the
/// command-line tool does.
pub fn render_summary_report(
    filename: &str,
    summary: &Summary,
) -> Result<Vec<u8>, ChemvizError> {
    let fields = ReportFields {
        filename: filename.to_string(),
        total_equipment: summary.total_equipment.to_string(),
        avg_flowrate: summary.avg_flowrate,
        avg_pressure: summary.avg_pressure,
        avg_temperature: summary.avg_temperature,
    };

    render(&fields)
}

/// Writes a rendered report to `output_file`, replacing any existing file.
pub fn write_report_to_file<P: AsRef<Path>>(
    output_file: P,
    pdf: &[u8],
) -> Result<(), ChemvizError> {
    let output_file = output_file.as_ref();
    std::fs::write(output_file, pdf).map_err(|source| ChemvizError::CreateFile {
        path: output_file.to_path_buf(),
        source,
    })?;
    info!("Wrote PDF report {:?}", output_file);
    Ok(())
}

fn render(fields: &ReportFields) -> Result<Vec<u8>, ChemvizError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let title_font_id = add_font(&mut doc, "Helvetica-Bold");
    let body_font_id = add_font(&mut doc, "Helvetica");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => title_font_id,
            "F2" => body_font_id,
        },
    });

    let mut operations = text_line("F1", TITLE_SIZE, TITLE_Y, REPORT_TITLE);
    for (idx, line) in fields.lines().iter().enumerate() {
        let y = FIRST_LINE_Y - LINE_SPACING * idx as i64;
        operations.extend(text_line("F2", BODY_SIZE, y, line));
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn add_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// The operations to draw one line of text at a fixed position.
fn text_line(font: &str, size: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// The byte used for characters the standard fonts cannot show.
const UNMAPPABLE: u8 = b'?';

/// Encodes `text` for a font using `WinAnsiEncoding`. That is Latin-1 apart
/// from 0x80..=0x9F, which holds the typographic characters listed below.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => UNMAPPABLE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn test_record() -> UploadRecord {
        UploadRecord {
            id: 1,
            filename: "test.csv".to_string(),
            total_equipment: 3,
            avg_flowrate: 15.0,
            avg_pressure: 5.33,
            avg_temperature: 70.25,
            uploaded_at: Utc.with_ymd_and_hms(2024, 9, 1, 5, 10, 44).unwrap(),
        }
    }

    fn extract_text(pdf: &[u8]) -> String {
        let doc = Document::load_mem(pdf).unwrap();
        doc.extract_text(&[1]).unwrap()
    }

    #[test]
    fn report_is_a_single_page_pdf() {
        let pdf = render_report(&test_record()).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn report_contains_every_field() {
        let pdf = render_report(&test_record()).unwrap();
        let text = extract_text(&pdf);

        assert!(text.contains(REPORT_TITLE), "{text}");
        assert!(text.contains("Filename: test.csv"), "{text}");
        assert!(text.contains("Total Equipment: 3"), "{text}");
        assert!(text.contains("Average Flowrate: 15.0"), "{text}");
        assert!(text.contains("Average Pressure: 5.33"), "{text}");
        assert!(text.contains("Average Temperature: 70.25"), "{text}");
    }

    #[test]
    fn non_ascii_filename_survives() {
        let record = UploadRecord {
            filename: "Wärmetauscher Größe.csv".to_string(),
            ..test_record()
        };
        let text = extract_text(&render_report(&record).unwrap());
        assert!(text.contains("Filename: Wärmetauscher Größe.csv"), "{text}");
    }

    #[test]
    fn characters_outside_win_ansi_are_replaced() {
        assert_eq!(encode_win_ansi("Ä€x"), [0xc4, 0x80, b'x']);
        assert_eq!(encode_win_ansi("反応器.csv"), b"???.csv");
    }

    #[test]
    fn report_is_written_to_file() {
        let pdf = render_report(&test_record()).unwrap();
        let output_file =
            std::env::temp_dir().join(format!("chemviz-report-{}.pdf", std::process::id()));

        write_report_to_file(&output_file, &pdf).unwrap();
        assert_eq!(std::fs::read(&output_file).unwrap(), pdf);
        std::fs::remove_file(&output_file).unwrap();
    }

    #[test]
    fn unwritable_report_names_the_file() {
        let output_file = std::env::temp_dir()
            .join("chemviz-no-such-directory")
            .join("report.pdf");

        match write_report_to_file(&output_file, b"%PDF") {
            Err(ChemvizError::CreateFile { path, .. }) => assert_eq!(path, output_file),
            other => panic!("expected CreateFile, got {other:?}"),
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let first = render_report(&test_record()).unwrap();
        let second = render_report(&test_record()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn summary_report_matches_record_report() {
        let record = test_record();
        let summary = Summary {
            total_equipment: 3,
            avg_flowrate: record.avg_flowrate,
            avg_pressure: record.avg_pressure,
            avg_temperature: record.avg_temperature,
            equipment_type_distribution: Default::default(),
            table_data: Vec::new(),
        };

        let from_summary = render_summary_report("test.csv", &summary).unwrap();
        let from_record = render_report(&record).unwrap();
        assert_eq!(from_summary, from_record);
    }
}
