//! HTTP surface: router assembly, middleware, and the JSON error shape.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::AppState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

/// Build the complete router. Mutating routes are bearer-guarded and
/// admin-only; reads and visitor-facing writes are public.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/projects", get(handlers::projects::list))
        .route("/api/projects/{id}", get(handlers::projects::get))
        .route("/api/skills", get(handlers::skills::list))
        .route("/api/blog", get(handlers::blog::list))
        // matchit permits one parameter name per segment position, so every
        // /api/blog/{x} route shares the {slug} label; the id-keyed handlers
        // extract their Uuid positionally.
        .route("/api/blog/{slug}", get(handlers::blog::read))
        .route("/api/blog/{slug}/like", post(handlers::blog::like))
        .route(
            "/api/blog/{slug}/comments",
            get(handlers::blog::list_comments).post(handlers::blog::add_comment),
        )
        .route("/api/journey", get(handlers::journey::list))
        .route("/api/contact", post(handlers::contact::submit))
        .route("/api/chatbot/chat", post(handlers::chatbot::chat))
        .route("/api/analytics/track", post(handlers::analytics::track))
        .route("/api/stats/github", get(handlers::stats::github))
        .route("/uploads/{*path}", get(handlers::uploads::serve));

    let authenticated = Router::new()
        .route("/api/auth/verify", get(handlers::auth::verify))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let admin = Router::new()
        .route("/api/projects", post(handlers::projects::create))
        .route(
            "/api/projects/{id}",
            put(handlers::projects::update).delete(handlers::projects::delete),
        )
        .route("/api/skills", post(handlers::skills::create))
        .route(
            "/api/skills/{id}",
            put(handlers::skills::update).delete(handlers::skills::delete),
        )
        .route("/api/blog", post(handlers::blog::create))
        .route(
            "/api/blog/{slug}",
            put(handlers::blog::update).delete(handlers::blog::delete),
        )
        .route("/api/journey", post(handlers::journey::create))
        .route(
            "/api/journey/{id}",
            put(handlers::journey::update).delete(handlers::journey::delete),
        )
        .route("/api/chatbot/history", get(handlers::chatbot::history))
        .route("/api/chatbot/daily", get(handlers::chatbot::daily))
        .route("/api/analytics/summary", get(handlers::analytics::summary))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    public
        .merge(authenticated)
        .merge(admin)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::cors,
        ))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}
