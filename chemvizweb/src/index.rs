use axum::extract::{Multipart, State};
use maud::{html, Markup};

use crate::{
    api::upload::receive_upload,
    components::{history_table::history_table, page::page, summary_view::summary_view},
    error::ApiResult,
    state::AppState,
};

const TITLE: &str = "Chemical Equipment Visualizer";

/// The home page: an upload form and the recent upload history.
pub async fn index(State(state): State<AppState>) -> ApiResult<Markup> {
    Ok(page(TITLE, home_view(&state, None).await?))
}

/// `POST /upload/`, the target of the upload form. Records the upload like
/// the JSON API does and shows its summary above the usual home page.
pub async fn upload_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Markup> {
    let (filename, summary) = receive_upload(&state, multipart).await?;
    let result = summary_view(&filename, &summary);
    Ok(page(TITLE, home_view(&state, Some(result)).await?))
}

async fn home_view(state: &AppState, result: Option<Markup>) -> ApiResult<Markup> {
    let keep = state.store.policy().keep();
    let records = state.store.list(keep).await?;

    Ok(html! {
        (upload_file_view())
        @if let Some(result) = result {
            (result)
        }
        h2 { "Last " (keep) " uploads" }
        (history_table(&records))
    })
}

fn upload_file_view() -> Markup {
    html! {
        form action="/upload/" method="post" enctype="multipart/form-data" {
            label for="file" { "Upload CSV of chemical equipment: " }
            input type="file" id="file" name="file" accept=".csv,text/csv";
            input type="submit" value="Upload";
        }
    }
}
