use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use crate::db::models::TimelineEntry;
use crate::db::timeline::{self, TimelineInput};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::forms::multipart::MultipartData;
use crate::forms::personal::TimelineForm;
use crate::forms::FormErrors;
use crate::media::TIMELINE_DIR;
use crate::routes::home::Html;
use crate::routes::views::ConfirmDeleteTemplate;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/timeline_list.html")]
pub struct TimelineListTemplate {
    pub user: Option<CurrentUser>,
    pub entries: Vec<TimelineEntry>,
}

#[derive(Template)]
#[template(path = "pages/timeline_detail.html")]
pub struct TimelineDetailTemplate {
    pub user: Option<CurrentUser>,
    pub entry: TimelineEntry,
}

#[derive(Template)]
#[template(path = "pages/timeline_form.html")]
pub struct TimelineFormTemplate {
    pub user: Option<CurrentUser>,
    pub entry: Option<TimelineEntry>,
    pub form: TimelineForm,
    pub errors: FormErrors,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/timeline/", get(timeline_list))
        .route("/timeline/create/", get(create_page).post(create_entry))
        .route("/timeline/{id}/", get(entry_detail))
        .route("/timeline/{id}/edit/", get(edit_page).post(edit_entry))
        .route(
            "/timeline/{id}/delete/",
            get(delete_page).post(delete_entry),
        )
}

fn owned_entry(state: &AppState, id: &str, user: &CurrentUser) -> AppResult<TimelineEntry> {
    let conn = state.db.get()?;
    timeline::find_owned(&conn, id, &user.id)?.ok_or(AppError::NotFound)
}

/// GET /timeline/: newest memories first.
async fn timeline_list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<TimelineListTemplate>> {
    let entries = {
        let conn = state.db.get()?;
        timeline::list_for_user(&conn, &user.id)?
    };
    Ok(Html(TimelineListTemplate {
        user: Some(user),
        entries,
    }))
}

/// GET /timeline/create/
async fn create_page(user: CurrentUser) -> Html<TimelineFormTemplate> {
    Html(TimelineFormTemplate {
        user: Some(user),
        entry: None,
        form: TimelineForm::default(),
        errors: FormErrors::default(),
    })
}

/// POST /timeline/create/
async fn create_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let data = MultipartData::collect(multipart).await?;
    let form = TimelineForm::from_multipart(&data);

    let input = match form.clean(true) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(Html(TimelineFormTemplate {
                user: Some(user),
                entry: None,
                form,
                errors,
            })
            .into_response())
        }
    };
    // clean(true) only succeeds with an image attached.
    let image = form
        .image
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Image is required".into()))?;

    let image_path = state.media.save(TIMELINE_DIR, image).await?;
    let id = match insert_entry(&state, &user.id, &input, &image_path) {
        Ok(id) => id,
        Err(e) => {
            state.media.discard(&[image_path]).await;
            return Err(e);
        }
    };

    Ok(Redirect::to(&format!("/timeline/{}/", id)).into_response())
}

/// GET /timeline/{id}/
async fn entry_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<TimelineDetailTemplate>> {
    let entry = owned_entry(&state, &id, &user)?;
    Ok(Html(TimelineDetailTemplate {
        user: Some(user),
        entry,
    }))
}

/// GET /timeline/{id}/edit/
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<TimelineFormTemplate>> {
    let entry = owned_entry(&state, &id, &user)?;
    Ok(Html(TimelineFormTemplate {
        user: Some(user),
        form: TimelineForm::from_entry(&entry),
        entry: Some(entry),
        errors: FormErrors::default(),
    }))
}

/// POST /timeline/{id}/edit/: the stored image is kept unless a new one is sent.
async fn edit_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let data = MultipartData::collect(multipart).await?;
    let form = TimelineForm::from_multipart(&data);
    let entry = owned_entry(&state, &id, &user)?;

    let input = match form.clean(false) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(Html(TimelineFormTemplate {
                user: Some(user),
                entry: Some(entry),
                form,
                errors,
            })
            .into_response())
        }
    };

    let image_path = match &form.image {
        Some(image) => Some(state.media.save(TIMELINE_DIR, image).await?),
        None => None,
    };
    if let Err(e) = update_entry(&state, &entry.id, &input, image_path.as_deref()) {
        if let Some(path) = image_path {
            state.media.discard(&[path]).await;
        }
        return Err(e);
    }

    Ok(Redirect::to(&format!("/timeline/{}/", entry.id)).into_response())
}

/// GET /timeline/{id}/delete/
async fn delete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<ConfirmDeleteTemplate>> {
    let entry = owned_entry(&state, &id, &user)?;
    Ok(Html(ConfirmDeleteTemplate {
        user: Some(user),
        kind: "memory",
        action: format!("/timeline/{}/delete/", entry.id),
        cancel_url: format!("/timeline/{}/", entry.id),
        name: entry.title,
    }))
}

/// POST /timeline/{id}/delete/
async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let entry = owned_entry(&state, &id, &user)?;
    let conn = state.db.get()?;
    timeline::delete(&conn, &entry.id)?;
    Ok(Redirect::to("/timeline/"))
}

fn insert_entry(
    state: &AppState,
    user_id: &str,
    input: &TimelineInput,
    image_path: &str,
) -> AppResult<String> {
    let conn = state.db.get()?;
    Ok(timeline::create(&conn, user_id, input, image_path)?)
}

fn update_entry(
    state: &AppState,
    id: &str,
    input: &TimelineInput,
    image_path: Option<&str>,
) -> AppResult<()> {
    let conn = state.db.get()?;
    Ok(timeline::update(&conn, id, input, image_path)?)
}
