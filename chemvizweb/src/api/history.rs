use axum::{extract::State, Json};

use crate::{api::models::HistoryEntry, error::ApiResult, state::AppState};

/// `GET /api/history/`. The most recent uploads, newest first.
pub async fn upload_history(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let records = state.store.list(state.store.policy().keep()).await?;
    Ok(Json(records.into_iter().map(HistoryEntry::from).collect()))
}
