use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::models::MessageWall;
use crate::db::messages::MessageFilter;
use crate::db::{messages, walls};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::views::{cards, MessageCard};
use crate::state::AppState;

const FEATURED_WALLS: i64 = 6;
const RECENT_MESSAGES: i64 = 8;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub featured_walls: Vec<MessageWall>,
    pub recent_messages: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub user: Option<CurrentUser>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => AppError::from(e).into_response(),
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> AppResult<Html<HomeTemplate>> {
    let viewer = user.as_ref().map(|u| u.id.as_str());
    let conn = state.db.get()?;
    let featured_walls = walls::recent_public(&conn, FEATURED_WALLS)?;
    let recent = messages::list(&conn, &MessageFilter::Public, RECENT_MESSAGES, 0)?;

    Ok(Html(HomeTemplate {
        recent_messages: cards(recent, viewer),
        featured_walls,
        user,
    }))
}

pub async fn about(MaybeUser(user): MaybeUser) -> Html<AboutTemplate> {
    Html(AboutTemplate { user })
}
