use chemviz_core::{formatting::format_history_date, model::UploadRecord};
use serde::{Deserialize, Serialize};

/// One line of the upload history as returned by `GET /api/history/`.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i32,
    pub filename: String,
    pub total_equipment: i64,
    pub uploaded_at: String,
}

impl From<UploadRecord> for HistoryEntry {
    fn from(record: UploadRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            total_equipment: record.total_equipment,
            uploaded_at: format_history_date(&record.uploaded_at),
        }
    }
}

/// Query string of `GET /api/download-pdf/`. The id is taken as a string so
/// that a missing or garbled id gets our own error message.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub id: Option<String>,
}
