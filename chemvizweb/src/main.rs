use std::{thread, time::Duration};

use access::BearerToken;
use api::app;
use args::parse_args;
use chemviz_database::{initialise_database, HistoryStore, RetentionPolicy};
use database::database_path;
use state::AppState;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

mod access;
mod api;
mod args;
mod components;
mod database;
mod error;
mod index;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_tracing();

    let args = parse_args();
    let db_path = database_path(&args.database)?;
    info!("Using database {:?}", db_path);

    let factory = initialise_database(&db_path).await?;
    let conn = factory.make_db_connection().await?;
    let store = HistoryStore::new(conn, RetentionPolicy::new(args.history_size));

    let mut state = AppState::new(store);
    if let Some(token) = &args.api_token {
        info!("API requests require a bearer token");
        state = state.with_access_policy(BearerToken::new(token.clone()));
    }

    let app = app(state, args.max_upload_bytes);

    // Bind to the requested port or a random one, then (optionally) use a
    // background thread to open the correct URL in the browser. We wait for a
    // bit in the background thread to ensure axum is started up.
    let port = args.port.unwrap_or(0);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    let addr = listener.local_addr()?;
    let url = format!("http://localhost:{}", addr.port());
    info!("Listening on {url}");
    if args.auto_open {
        thread::spawn(|| {
            thread::sleep(Duration::from_secs_f32(0.5));
            // Ignore any errors, this is a "nice-to-have" anyway.
            let _ = opener::open_browser(url);
        });
    }

    // We block here. Closing the browser window does
    // not shut down the app.
    axum::serve(listener, app).await?;

    // This code only runs on exit.
    Ok(())
}

fn configure_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE) // Makes #[instrument] output something
        .with_env_filter(filter)
        .init();
}
