use chemviz_core::{
    formatting::{format_history_date, format_number},
    model::UploadRecord,
};
use maud::{html, Markup};

/// Returns the markup for the table of recent uploads, each with a link to
/// its PDF report.
pub fn history_table(records: &[UploadRecord]) -> Markup {
    if records.is_empty() {
        return html! {
            p { "Nothing has been uploaded yet." }
        };
    }

    html! {
        table {
            thead {
                tr {
                    th { "Filename" }
                    th { "Total Equipment" }
                    th { "Average Flowrate" }
                    th { "Average Pressure" }
                    th { "Average Temperature" }
                    th { "Uploaded At" }
                    th {}
                }
            }
            tbody {
                @for record in records {
                    tr {
                        td { (record.filename) }
                        td { (record.total_equipment) }
                        td { (format_number(record.avg_flowrate)) }
                        td { (format_number(record.avg_pressure)) }
                        td { (format_number(record.avg_temperature)) }
                        td { (format_history_date(&record.uploaded_at)) }
                        td {
                            a href=(format!("/api/download-pdf/?id={}", record.id)) { "PDF" }
                        }
                    }
                }
            }
        }
    }
}
