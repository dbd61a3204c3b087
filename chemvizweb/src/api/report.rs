use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use chemviz_core::report::render_report;
use tracing::instrument;

use crate::{
    api::models::ReportQuery,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// `GET /api/download-pdf/?id=K`. Sends the PDF report for record K as an
/// attachment.
#[instrument(skip(state))]
pub async fn download_pdf(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request().message("Missing ID"))?;
    let id: i32 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request().message(format!("Invalid ID: {id}")))?;

    let record = state.store.get(id).await?;
    let pdf = render_report(&record)?;

    let disposition = HeaderValue::from_str(&content_disposition(&record.filename))
        .map_err(|_| ApiError::server_error())?;

    let mut response = pdf.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// The download is named after the uploaded file. Characters that would
/// break the quoted header value are replaced.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("attachment; filename=\"{safe}.pdf\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_uses_the_upload_name() {
        assert_eq!(
            content_disposition("test.csv"),
            "attachment; filename=\"test.csv.pdf\""
        );
    }

    #[test]
    fn disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a\"b\r\n.csv"),
            "attachment; filename=\"a_b__.csv.pdf\""
        );
    }
}
