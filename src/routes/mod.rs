pub mod api;
pub mod assets;
pub mod auth;
pub mod gallery;
pub mod home;
pub mod messages;
pub mod special_dates;
pub mod themes;
pub mod timeline;
pub mod users;
pub mod views;
pub mod walls;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The whole site. Uploaded media is served read-only from the storage root.
pub fn app(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes());

    Router::new()
        .route("/", get(home::index))
        .route("/about/", get(home::about))
        .route("/assets/{*path}", get(assets::serve))
        .nest_service("/media", media)
        .merge(auth::router())
        .merge(users::router())
        .merge(walls::router())
        .merge(messages::router())
        .merge(timeline::router())
        .merge(special_dates::router())
        .merge(themes::router())
        .merge(api::router())
        .merge(gallery::router())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
