use crate::db::Database;
use axum::{
    Router,
    extract::Path as AxumPath,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::Embed;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

mod errors;
mod handlers;
mod pages;

pub use errors::AppError;

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }
}

/// Front-end assets compiled into the binary.
#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn embedded(path: &str) -> Response {
    match StaticAssets::get(path) {
        Some(content) => ([(header::CONTENT_TYPE, content_type(path))], content.data).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the single-page front end.
async fn index() -> Response {
    embedded("index.html")
}

/// Serve embedded static files at /static/{path}.
async fn static_handler(AxumPath(path): AxumPath<String>) -> Response {
    embedded(&path)
}

/// Build the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    // One INFO line per request, so `--log-level info` shows traffic.
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/users", post(handlers::create_user))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/languages",
            get(handlers::list_languages).post(handlers::create_language),
        )
        .route(
            "/languages/{id}",
            get(handlers::get_language).delete(handlers::delete_language),
        )
        .route(
            "/catalogs",
            get(handlers::list_catalogs).post(handlers::create_catalog),
        )
        .route(
            "/catalogs/{id}",
            get(handlers::get_catalog)
                .put(handlers::update_catalog)
                .delete(handlers::delete_catalog),
        )
        .route(
            "/catalogs/{id}/words",
            get(handlers::list_words).post(handlers::create_word),
        )
        .route(
            "/words/{id}",
            get(handlers::get_word)
                .put(handlers::update_word)
                .delete(handlers::delete_word),
        )
        .route("/stats", get(handlers::stats));

    Router::new()
        .route("/", get(index))
        .route("/health", get(handlers::health))
        .route("/static/{*path}", get(static_handler))
        .route("/catalogs/{id}", get(pages::catalog))
        .nest("/api", api)
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

/// Open and migrate the database, then serve until Ctrl-C or SIGTERM.
pub async fn serve(db_path: &std::path::Path, bind: &str, port: u16) -> anyhow::Result<()> {
    let db = Database::open(db_path)?;
    db.migrate()?;
    let app = create_router(AppState::new(db));

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        db = %db_path.display(),
        "words listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
