pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me).put(routes::auth::update_me));

    let user_routes = Router::new()
        .route("/", get(routes::user::list))
        .route("/{user_id}", get(routes::user::get))
        .route("/{user_id}/action", get(routes::user::actions))
        .route("/{user_id}/subscribe", post(routes::user::subscribe));

    let action_routes = Router::new()
        .route("/", post(routes::action::create))
        .route(
            "/{action_id}",
            get(routes::action::get).delete(routes::action::delete),
        )
        .route("/{action_id}/comment", post(routes::action::comment))
        .route("/{action_id}/rate", post(routes::action::rate))
        .route("/{action_id}/share", post(routes::action::share));

    // Publication snapshots and the feed RPC methods
    let feed_routes = Router::new()
        .route("/", get(routes::feed::feed_items))
        .route("/news", get(routes::feed::news))
        .route("/notifications", get(routes::feed::notifications))
        .route("/notifications/unread", get(routes::feed::unread_count))
        .route("/read", post(routes::feed::mark_read))
        .route("/{feed_item_id}", delete(routes::feed::remove));

    let notification_routes =
        Router::new().route("/{action_id}", delete(routes::notification::remove));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/user", user_routes)
        .nest("/action", action_routes)
        .nest("/feed", feed_routes)
        .nest("/notification", notification_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ws_connections": state.ws_storage.connection_count(),
    }))
}
