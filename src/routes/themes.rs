use askama::Template;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use crate::db::models::Theme;
use crate::db::themes;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/themes.html")]
pub struct ThemesTemplate {
    pub user: Option<CurrentUser>,
    pub themes: Vec<Theme>,
}

#[derive(Template)]
#[template(path = "pages/theme_detail.html")]
pub struct ThemeDetailTemplate {
    pub user: Option<CurrentUser>,
    pub theme: Theme,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/themes/", get(theme_list))
        .route("/themes/{id}/", get(theme_detail))
}

async fn theme_list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> AppResult<Html<ThemesTemplate>> {
    let conn = state.db.get()?;
    let themes = themes::list(&conn)?;
    Ok(Html(ThemesTemplate { user, themes }))
}

async fn theme_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Html<ThemeDetailTemplate>> {
    let conn = state.db.get()?;
    let theme = themes::find(&conn, &id)?.ok_or(AppError::NotFound)?;
    Ok(Html(ThemeDetailTemplate { user, theme }))
}
