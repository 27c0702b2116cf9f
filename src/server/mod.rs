//! # HTTP Server for the Editing Session
//!
//! Exposes the template model and rendering pipeline as a JSON API for an
//! external editing UI: dataset upload, template CRUD, per-row preview, and
//! batch export.
//!
//! ## Usage
//!
//! ```bash
//! sello serve --listen 0.0.0.0:8080
//! ```

mod handlers;
mod state;

pub use state::ServerConfig;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::error::SelloError;
use state::{AppState, CACHE_EXPIRATION_SECS};

/// Start the HTTP server.
pub async fn serve(config: ServerConfig) -> Result<(), SelloError> {
    let app_state = Arc::new(AppState::new());

    // Spawn background cache cleanup task
    tokio::spawn(cleanup_caches(app_state.clone()));

    let app = Router::new()
        // Dataset (25MB limit for uploads)
        .route(
            "/api/dataset",
            post(handlers::upload_dataset).layer(DefaultBodyLimit::max(25 * 1024 * 1024)),
        )
        // Template CRUD
        .route(
            "/api/template",
            get(handlers::get_template).put(handlers::put_template),
        )
        .route("/api/template/elements", post(handlers::add_element))
        .route(
            "/api/template/elements/:id",
            put(handlers::update_element).delete(handlers::delete_element),
        )
        .route(
            "/api/template/elements/:id/move",
            post(handlers::move_element),
        )
        .route("/api/template/canvas", put(handlers::put_canvas))
        .route("/api/qr-config", put(handlers::put_qr_config))
        // Rendering
        .route("/api/preview/:row", get(handlers::preview))
        .route("/api/export", post(handlers::export))
        .with_state(app_state);

    println!("Sello HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);
    println!();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            SelloError::Export(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SelloError::Export(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to clean up expired cache entries.
async fn cleanup_caches(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(CACHE_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let (qr_removed, image_removed) = state.renderer.context().evict_stale(expiration).await;
        if qr_removed + image_removed > 0 {
            log::debug!(
                "cache cleanup: dropped {} QR bitmaps, {} images",
                qr_removed,
                image_removed
            );
        }
    }
}
