//! The JSON/PDF API consumed by the web page and by desktop clients.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    access::require_access,
    index::{index, upload_page},
    state::AppState,
};

mod history;
pub(crate) mod models;
mod report;
pub(crate) mod upload;

pub use history::upload_history;
pub use report::download_pdf;
pub use upload::upload_csv;

/// Builds the complete application router. The access policy in `state`
/// guards every route, the HTML pages included, since they show the same
/// history as `/api/history/`.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/upload/", post(upload_csv))
        .route("/history/", get(upload_history))
        .route("/download-pdf/", get(download_pdf));

    Router::new()
        .route("/", get(index))
        .route("/upload/", post(upload_page))
        .nest("/api", api)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
