use axum::{Json, Router, routing::{get, post, put}, middleware};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{auth_handlers, user_handlers, middleware as auth_middleware, AppState};

/// GET /v1/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(|| async { "sessionkit API running" }))
        .route("/v1/health", get(health))
        .route("/v1/auth/register", post(auth_handlers::register))
        .route("/v1/auth/login", post(auth_handlers::login))
        .route("/v1/auth/refresh", post(auth_handlers::refresh))
        .route("/v1/auth/logout", post(auth_handlers::logout));

    // Protected routes (require a valid access token)
    let protected_routes = Router::new()
        .route("/v1/auth/logout-all", post(auth_handlers::logout_all))
        .route("/v1/users/me", get(user_handlers::get_me).put(user_handlers::update_profile))
        .route("/v1/users/me/avatar", put(user_handlers::update_avatar))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
