pub mod auth;
pub mod error;
pub mod rooms;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::hub::ws::ws_handler;
use crate::state::AppState;

/// Build the full API router.
///
/// Routes split into **public** (no auth required — health probe and the
/// WebSocket upgrade, which authenticates itself via the `CreateRoom`/etc.
/// commands it carries) and **protected** (gated behind the bearer-token
/// middleware).
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/healthz", get(rooms::healthz))
        .route("/ws", get(ws_handler));

    let protected = Router::new()
        .route("/api/rooms", get(rooms::list_rooms))
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/rooms/:id", delete(rooms::delete_room))
        .route("/api/rooms/:id/agents", get(rooms::get_room_agents))
        .route("/api/rooms/:id/history", get(rooms::get_room_history))
        .route("/api/rooms/:id/export", get(rooms::export_room))
        .route("/api/settings", get(rooms::get_settings))
        .route("/api/settings", post(rooms::post_settings))
        .route("/api/test-connection", post(rooms::test_connection))
        .route("/api/discussion/start", post(rooms::start_discussion))
        .route("/api/discussion/status/:id", get(rooms::discussion_status))
        .route("/api/discussion/control/:id", post(rooms::discussion_control))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    public
        .merge(protected)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
