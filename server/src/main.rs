use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;

mod error;
mod handlers;
mod logic;
mod proxy;
mod state;
mod storage;

use crate::handlers::{save_votes, submissions, vote_data, ws_handler};
use crate::state::AppState;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding votes.json and submissions.json.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Generation backend endpoint that /api/process forwards to.
    #[arg(long)]
    generate_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data"));
    if let Err(error) = tokio::fs::create_dir_all(&data_dir).await {
        tracing::error!(%error, "failed to create data dir");
    }
    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let votes = storage::load_votes(&data_dir).await;
    let submissions_list = storage::load_submissions(&data_dir).await;
    tracing::info!(
        votes = votes.len(),
        submissions = submissions_list.len(),
        "loaded persisted data"
    );
    let generate_url = args
        .generate_url
        .or_else(|| std::env::var("GENERATE_URL").ok());
    if generate_url.is_none() {
        tracing::warn!("no generation backend configured; /api/process will fail");
    }

    let state = AppState::new(data_dir, generate_url, votes, submissions_list);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/vote-data", get(vote_data))
        .route("/api/save-votes", post(save_votes))
        .route("/api/submissions", get(submissions))
        .route("/api/process", post(proxy::process))
        .route("/proxy-image", get(proxy::proxy_image))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Muralboard running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app).await.expect("Server crashed");
}
