use axum::{
    extract::{Multipart, State},
    Json,
};
use chemviz_core::{aggregate::aggregate, model::Summary, read::read_table_from_slice};
use tracing::{info, instrument};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// The multipart field that carries the CSV file.
const FILE_FIELD: &str = "file";

/// Used when the client does not send a filename with the file.
const DEFAULT_FILENAME: &str = "upload.csv";

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// `POST /api/upload/`. Parses and summarises the uploaded CSV, records the
/// summary in the history, and returns the summary along with the rows.
/// Nothing is recorded if the file is rejected.
#[instrument(skip_all)]
pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Summary>> {
    let (_, summary) = receive_upload(&state, multipart).await?;
    Ok(Json(summary))
}

/// Reads the "file" field of `multipart`, summarises it and records the
/// summary. Returns the filename the summary was recorded under. Shared by the
/// JSON API and the upload form on the index page.
pub(crate) async fn receive_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> ApiResult<(String, Summary)> {
    let upload = read_upload(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request().message("No file uploaded"))?;

    info!(
        "Received {:?}, {} bytes",
        upload.filename,
        upload.data.len()
    );

    let table = read_table_from_slice(&upload.data)?;
    let summary = aggregate(table)?;
    let record = state.store.record(&summary, &upload.filename).await?;
    info!("Upload {:?} saved as record {}", upload.filename, record.id);

    Ok((upload.filename, summary))
}

/// Note that this is a multipart post. We only care about the field called
/// "file"; anything else that is sent is skipped.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let data = field.bytes().await?;
        return Ok(Some(UploadedFile {
            filename,
            data: data.to_vec(),
        }));
    }

    Ok(None)
}
