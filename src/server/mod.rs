// Riffwise HTTP API
//
// /ai/* generation endpoints, health, and the catalogue CRUD routes

mod crud;
pub mod error;
pub mod handlers;
pub mod types;

pub use error::ApiError;
pub use handlers::HealthResponse;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::constants::MAX_BODY_BYTES;
use crate::config::ServerConfig;
use crate::generation::FallbackOrchestrator;
use crate::store::Store;

/// Shared handler state
pub struct AppState {
    pub orchestrator: Arc<FallbackOrchestrator>,
    pub store: Store,
    /// Deadline for one orchestrated generation call
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(orchestrator: Arc<FallbackOrchestrator>, store: Store, request_timeout: Duration) -> Self {
        Self {
            orchestrator,
            store,
            request_timeout,
        }
    }
}

/// Build the router with every route and the body limit applied.
pub fn create_router(state: Arc<AppState>) -> Router {
    let ai = Router::new()
        .route("/chords", post(handlers::song_arrangement))
        .route("/progression", post(handlers::chord_progression))
        .route("/backing-track", post(handlers::backing_track))
        .route("/rhythm", post(handlers::rhythm))
        .route("/melody", post(handlers::melody))
        .route("/improv", post(handlers::improv))
        .route("/lyrics", post(handlers::lyrics))
        .route("/practice-advice", post(handlers::practice_advice))
        .route("/lesson", post(handlers::lesson));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/ai", ai)
        .route("/users", get(crud::list_users).post(crud::create_user))
        .route("/users/:id", get(crud::get_user))
        .route(
            "/users/:id/practice-sessions",
            get(crud::list_practice_sessions).post(crud::create_practice_session),
        )
        .route("/instruments", get(crud::list_instruments).post(crud::create_instrument))
        .route("/lessons", get(crud::list_lessons).post(crud::create_lesson))
        .route("/songs", get(crud::list_songs).post(crud::create_song))
        .route("/songs/:id", get(crud::get_song))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// CORS policy for the configured origins; `"*"` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_address))?;

    let app = create_router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Starting Riffwise API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
