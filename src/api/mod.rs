pub mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session::session_layer;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Pages that need a signed-in user; anonymous requests are sent to `/`.
    let protected = Router::new()
        .route("/main", get(handlers::dashboard).post(handlers::add_todo))
        .route("/delete", post(handlers::delete_todo))
        .route("/create", get(handlers::new_note).post(handlers::create_note))
        .route(
            "/notes/{slug}",
            get(handlers::show_note).post(handlers::delete_note),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_login));

    let public = Router::new()
        .route("/", get(handlers::login_page).post(handlers::login))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/logout", get(handlers::logout))
        .route("/auth/google", get(handlers::google_start))
        .route("/auth/google/main", get(handlers::google_callback))
        .route("/health", get(handlers::health));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(session_layer(&state.config.session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
