//! HTTP API for the netsim engine.
//!
//! A thin transport over the store and the hub: REST routes for the project
//! operations plus the `/ws` streaming endpoint. All handlers return
//! `Result<impl IntoResponse, NetsimError>` so errors map to HTTP status
//! codes through the `IntoResponse` implementation on `NetsimError`.

mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::projects::ProjectStore;
use crate::websocket::{self, ProjectHub};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProjectStore>,
    pub hub: Arc<ProjectHub>,
}

/// Build the API router.
///
/// - `GET /health`: liveness probe
/// - `GET /ws`: replica synchronization channel
/// - `/api/v1/projects`: project CRUD and event submission
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ws", get(websocket::ws_handler))
        .nest("/api/v1", v1_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/:id",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/projects/:id/events", post(handlers::submit_event))
}

/// API response wrapper.
#[derive(serde::Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
