use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/signup/",
            get(handlers::signup_page).post(handlers::signup),
        )
        .route(
            "/accounts/login/",
            get(handlers::login_page).post(handlers::login),
        )
        .route("/accounts/logout/", post(handlers::logout))
}
