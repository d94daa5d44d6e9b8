use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::db::messages::{self, MessageFilter};
use crate::db::models::{MessageWall, Theme};
use crate::db::walls::{self, WallInput};
use crate::db::{self, themes};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::message::MessageForm;
use crate::forms::wall::{WallForm, SLUG_TAKEN};
use crate::forms::FormErrors;
use crate::pagination::{Page, PageQuery, Paginator, PAGE_SIZE};
use crate::routes::home::Html;
use crate::routes::views::{cards, ConfirmDeleteTemplate, MessageCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/wall_form.html")]
pub struct WallFormTemplate {
    pub user: Option<CurrentUser>,
    /// `None` while creating.
    pub wall: Option<MessageWall>,
    pub form: WallForm,
    pub errors: FormErrors,
    pub themes: Vec<Theme>,
}

#[derive(Template)]
#[template(path = "pages/wall_detail.html")]
pub struct WallDetailTemplate {
    pub user: Option<CurrentUser>,
    pub wall: MessageWall,
    pub theme: Option<Theme>,
    pub is_owner: bool,
    pub page: Page<MessageCard>,
    pub form: MessageForm,
    pub themes: Vec<Theme>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wall/create/", get(create_page).post(create_wall))
        .route("/wall/{custom_url}/", get(wall_detail))
        .route("/wall/{custom_url}/edit/", get(edit_page).post(edit_wall))
        .route(
            "/wall/{custom_url}/delete/",
            get(delete_page).post(delete_wall),
        )
}

/// Insert or update a wall, turning a lost slug race into a field error.
fn save_wall(
    state: &AppState,
    owner_id: &str,
    existing: Option<&str>,
    input: &WallInput,
) -> AppResult<Result<(), FormErrors>> {
    let conn = state.db.get()?;
    let mut errors = FormErrors::default();

    if walls::slug_taken(&conn, &input.custom_url, existing)? {
        errors.add("custom_url", SLUG_TAKEN);
        return Ok(Err(errors));
    }

    let saved = match existing {
        Some(id) => walls::update(&conn, id, input),
        None => walls::create(&conn, owner_id, input).map(|_| ()),
    };
    match saved {
        Ok(()) => Ok(Ok(())),
        Err(e) if db::is_unique_violation(&e) => {
            errors.add("custom_url", SLUG_TAKEN);
            Ok(Err(errors))
        }
        Err(e) => Err(e.into()),
    }
}

fn wall_url(custom_url: &str) -> String {
    format!("/wall/{}/", custom_url)
}

/// GET /wall/create/
async fn create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<WallFormTemplate>> {
    let themes = {
        let conn = state.db.get()?;
        themes::list(&conn)?
    };
    Ok(Html(WallFormTemplate {
        user: Some(user),
        wall: None,
        form: WallForm {
            is_public: Some("on".to_string()),
            ..Default::default()
        },
        errors: FormErrors::default(),
        themes,
    }))
}

/// POST /wall/create/
async fn create_wall(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<WallForm>,
) -> AppResult<Response> {
    let themes = {
        let conn = state.db.get()?;
        themes::list(&conn)?
    };

    let outcome = match form.clean(&themes) {
        Ok(input) => save_wall(&state, &user.id, None, &input)?.map(|()| input),
        Err(errors) => Err(errors),
    };

    match outcome {
        Ok(input) => {
            tracing::info!("{} created wall {}", user.username, input.custom_url);
            Ok(Redirect::to(&wall_url(&input.custom_url)).into_response())
        }
        Err(errors) => Ok(Html(WallFormTemplate {
            user: Some(user),
            wall: None,
            form,
            errors,
            themes,
        })
        .into_response()),
    }
}

/// GET /wall/{custom_url}/: public messages plus the viewer's own.
async fn wall_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(custom_url): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<WallDetailTemplate>> {
    let viewer = user.as_ref().map(|u| u.id.as_str());
    let conn = state.db.get()?;

    let wall = walls::find_by_slug(&conn, &custom_url)?.ok_or(AppError::NotFound)?;
    let theme = match &wall.theme_id {
        Some(id) => themes::find(&conn, id)?,
        None => None,
    };

    let filter = MessageFilter::Wall {
        wall_id: &wall.id,
        viewer_id: viewer,
    };
    let total = messages::count(&conn, &filter)?;
    let paginator = Paginator::new(query.page.as_deref(), total, PAGE_SIZE);
    let items = messages::list(&conn, &filter, PAGE_SIZE, paginator.offset())?;
    let themes = if user.is_some() {
        themes::list(&conn)?
    } else {
        Vec::new()
    };

    Ok(Html(WallDetailTemplate {
        is_owner: viewer == Some(wall.owner_id.as_str()),
        page: paginator.page(cards(items, viewer)),
        user,
        wall,
        theme,
        form: MessageForm::default(),
        themes,
    }))
}

/// GET /wall/{custom_url}/edit/
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(custom_url): Path<String>,
) -> AppResult<Html<WallFormTemplate>> {
    let conn = state.db.get()?;
    let wall = walls::find_owned(&conn, &custom_url, &user.id)?.ok_or(AppError::NotFound)?;
    let themes = themes::list(&conn)?;

    Ok(Html(WallFormTemplate {
        user: Some(user),
        form: WallForm::from_wall(&wall),
        wall: Some(wall),
        errors: FormErrors::default(),
        themes,
    }))
}

/// POST /wall/{custom_url}/edit/
async fn edit_wall(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(custom_url): Path<String>,
    Form(form): Form<WallForm>,
) -> AppResult<Response> {
    let (wall, themes) = {
        let conn = state.db.get()?;
        let wall = walls::find_owned(&conn, &custom_url, &user.id)?.ok_or(AppError::NotFound)?;
        (wall, themes::list(&conn)?)
    };

    let outcome = match form.clean(&themes) {
        Ok(input) => save_wall(&state, &user.id, Some(&wall.id), &input)?.map(|()| input),
        Err(errors) => Err(errors),
    };

    match outcome {
        Ok(input) => Ok(Redirect::to(&wall_url(&input.custom_url)).into_response()),
        Err(errors) => Ok(Html(WallFormTemplate {
            user: Some(user),
            wall: Some(wall),
            form,
            errors,
            themes,
        })
        .into_response()),
    }
}

/// GET /wall/{custom_url}/delete/: confirmation page.
async fn delete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(custom_url): Path<String>,
) -> AppResult<Html<ConfirmDeleteTemplate>> {
    let wall = {
        let conn = state.db.get()?;
        walls::find_owned(&conn, &custom_url, &user.id)?.ok_or(AppError::NotFound)?
    };

    Ok(Html(ConfirmDeleteTemplate {
        user: Some(user),
        kind: "wall",
        name: wall.title,
        action: format!("/wall/{}/delete/", wall.custom_url),
        cancel_url: wall_url(&wall.custom_url),
    }))
}

/// POST /wall/{custom_url}/delete/: messages and their media go with it.
async fn delete_wall(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(custom_url): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let wall = walls::find_owned(&conn, &custom_url, &user.id)?.ok_or(AppError::NotFound)?;
    walls::delete(&conn, &wall.id)?;
    tracing::info!("{} deleted wall {}", user.username, wall.custom_url);
    Ok(Redirect::to("/"))
}
