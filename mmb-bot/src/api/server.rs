//! HTTP server setup and routing
//!
//! Control endpoints for the playback engine, catalog browsing, the chat
//! command bridge and the SSE event stream.

use crate::catalog::Catalog;
use crate::commands::CommandHandler;
use crate::playback::PlaybackEngine;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: PlaybackEngine,
    pub catalog: Catalog,
    pub commands: Arc<dyn CommandHandler>,
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Catalog
        .route("/tracks", get(super::handlers::get_tracks))
        .route("/albums", get(super::handlers::get_albums))
        // Playlist editing
        .route("/add_single", post(super::handlers::add_single))
        .route("/add_all", post(super::handlers::add_all))
        .route("/add_album", post(super::handlers::add_album))
        .route("/playlist", get(super::handlers::get_playlist))
        .route("/playlist/:index", delete(super::handlers::remove_from_playlist))
        .route("/clear", post(super::handlers::clear))
        // Mode
        .route("/set_mode", post(super::handlers::set_mode))
        .route("/mode", get(super::handlers::get_mode))
        // Transport
        .route("/start", post(super::handlers::start))
        .route("/stop", post(super::handlers::stop))
        .route("/skip", post(super::handlers::skip))
        .route("/pause", post(super::handlers::pause))
        .route("/unpause", post(super::handlers::unpause))
        // Status
        .route("/nowplaying", get(super::handlers::now_playing))
        .route("/state", get(super::handlers::get_state))
        // Chat command bridge
        .route("/command", post(super::handlers::command))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
