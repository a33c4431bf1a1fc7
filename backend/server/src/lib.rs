//! Documentation of a small guestbook backend.
//!
//!
//!
//! # General Infrastructure
//! - One axum process, one SQLite file next to it
//! - Frontend talks to the `/api` routes directly, CORS is open to any origin
//! - Chat requests are forwarded to DashScope, nothing about them is stored
//! - Feedback is written straight to SQLite, no cache in between
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Body | Success |
//! |---|---|---|---|
//! | `POST` | `/api/chat` | `{ message }` | `{ success, data: { message, timestamp } }` |
//! | `POST` | `/api/feedback` | `{ name, email, message }` | `{ success, message }` |
//! | `GET` | `/api/feedback` | | `{ success, data: [record] }` |
//! | `DELETE` | `/api/feedback/:id` | | `{ success, message }` |
//!
//! Failures come back as `{ success: false, message }`. Chat failures also carry an `error` string with the upstream
//! cause. Missing fields and unreadable bodies are `400`, everything else is `500`.
//!
//!
//!
//! # Notes
//!
//! ## Client IP
//! We sit behind a reverse proxy in production, so the first entry of `X-Forwarded-For` wins. Without it we use the
//! socket peer. IPv4 clients on a dual-stack socket show up as `::ffff:a.b.c.d`, the prefix is dropped.
//!
//! ## Shutdown
//! Ctrl+C or SIGTERM stops accepting connections, lets in-flight requests finish, then closes the database pool.
//!
//!
//!
//! # Setup
//!
//! The DashScope key is required. Either export it or mount it as a secret.
//! ```sh
//! export DASHSCOPE_API_KEY=sk-...
//! ```
//!
//! Optional overrides.
//! ```sh
//! export PORT=3000
//! export DATABASE_PATH=feedback.db
//! export CHAT_ENDPOINT=https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation
//! export CHAT_MODEL=qwen-turbo
//! export RUST_LOG=info
//! ```
//!
//! Run.
//! ```sh
//! cargo run -p backend
//! ```
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};

use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod chat;
pub mod config;
pub mod database;
pub mod error;
pub mod feedback;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{chat_handler, delete_feedback_handler, list_feedback_handler, submit_feedback_handler};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    run(state, listener, shutdown_signal()).await?;

    Ok(())
}

/// Serves until `shutdown` resolves, then closes the database, also when serving failed.
pub async fn run<F>(state: Arc<AppState>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state.clone());

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    if let Err(e) = &served {
        error!("Server error: {e}");
    }

    info!("Server shutting down...");
    state.feedback.close().await;
    info!("Database connection closed");

    served
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/feedback",
            get(list_feedback_handler).post(submit_feedback_handler),
        )
        .route("/api/feedback/:id", delete(delete_feedback_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
