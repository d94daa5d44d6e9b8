use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::db::messages::{self, MessageInput};
use crate::db::models::{Message, MessageWall, Theme};
use crate::db::{media, themes, walls};
use crate::error::{AppError, AppResult};
use crate::extractors::{is_ajax, CurrentUser};
use crate::forms::message::MessageForm;
use crate::forms::multipart::{MultipartData, UploadedFile};
use crate::forms::FormErrors;
use crate::media::{MediaKind, ATTACHMENTS_DIR};
use crate::routes::home::Html;
use crate::routes::views::ConfirmDeleteTemplate;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/message_form.html")]
pub struct MessageFormTemplate {
    pub user: Option<CurrentUser>,
    pub wall: MessageWall,
    /// `None` while creating.
    pub message: Option<Message>,
    pub form: MessageForm,
    pub errors: FormErrors,
    pub themes: Vec<Theme>,
}

impl MessageFormTemplate {
    /// Where the form posts back to.
    pub fn action(&self) -> String {
        match &self.message {
            Some(message) => format!("/message/{}/edit/", message.id),
            None => format!("/message/create/{}/", self.wall.id),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/message/create/{wall_id}/",
            get(create_page).post(create_message),
        )
        .route("/message/{id}/edit/", get(edit_page).post(edit_message))
        .route(
            "/message/{id}/delete/",
            get(delete_page).post(delete_message),
        )
}

fn wall_url(wall: &MessageWall) -> String {
    format!("/wall/{}/", wall.custom_url)
}

/// JSON for script callers, a redirect to the wall for everyone else.
fn done(headers: &HeaderMap, wall_url: &str) -> Response {
    if is_ajax(headers) {
        Json(json!({ "status": "success" })).into_response()
    } else {
        Redirect::to(wall_url).into_response()
    }
}

fn rejected(headers: &HeaderMap, template: MessageFormTemplate) -> Response {
    if is_ajax(headers) {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "errors": template.errors })),
        )
            .into_response()
    } else {
        Html(template).into_response()
    }
}

/// Write the files to storage, then record the message change and one
/// attachment row per file in a single transaction. Files written before a
/// failure are removed again.
async fn store_message(
    state: &AppState,
    author_id: &str,
    target: Target<'_>,
    input: &MessageInput,
    files: &[UploadedFile],
) -> AppResult<String> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        match state.media.save(ATTACHMENTS_DIR, file).await {
            Ok(path) => stored.push((path, MediaKind::from_file_name(&file.file_name))),
            Err(e) => {
                discard(state, &stored).await;
                return Err(e.into());
            }
        }
    }

    let result = record_message(state, author_id, target, input, &stored);
    if result.is_err() {
        discard(state, &stored).await;
    }
    result
}

async fn discard(state: &AppState, stored: &[(String, MediaKind)]) {
    let paths: Vec<String> = stored.iter().map(|(path, _)| path.clone()).collect();
    state.media.discard(&paths).await;
}

fn record_message(
    state: &AppState,
    author_id: &str,
    target: Target<'_>,
    input: &MessageInput,
    stored: &[(String, MediaKind)],
) -> AppResult<String> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    let message_id = match target {
        Target::New { wall } => messages::create(&tx, &wall.id, author_id, &wall.owner_id, input)?,
        Target::Existing { id } => {
            messages::update(&tx, id, input)?;
            id.to_string()
        }
    };
    for (path, kind) in stored {
        media::create(&tx, Some(&message_id), author_id, path, *kind)?;
    }
    tx.commit()?;

    Ok(message_id)
}

enum Target<'a> {
    New { wall: &'a MessageWall },
    Existing { id: &'a str },
}

/// GET /message/create/{wall_id}/
async fn create_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(wall_id): Path<String>,
) -> AppResult<Html<MessageFormTemplate>> {
    let conn = state.db.get()?;
    let wall = walls::find(&conn, &wall_id)?.ok_or(AppError::NotFound)?;
    let themes = themes::list(&conn)?;

    Ok(Html(MessageFormTemplate {
        user: Some(user),
        wall,
        message: None,
        form: MessageForm::default(),
        errors: FormErrors::default(),
        themes,
    }))
}

/// POST /message/create/{wall_id}/: the author is the current user and the
/// recipient is the wall's owner.
async fn create_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(wall_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let data = MultipartData::collect(multipart).await?;
    let form = MessageForm::from_multipart(&data);

    let (wall, themes) = {
        let conn = state.db.get()?;
        let wall = walls::find(&conn, &wall_id)?.ok_or(AppError::NotFound)?;
        (wall, themes::list(&conn)?)
    };

    let input = match form.clean(&themes) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(rejected(
                &headers,
                MessageFormTemplate {
                    user: Some(user),
                    wall,
                    message: None,
                    form,
                    errors,
                    themes,
                },
            ))
        }
    };

    let id = store_message(
        &state,
        &user.id,
        Target::New { wall: &wall },
        &input,
        &form.media_files,
    )
    .await?;
    tracing::debug!(
        "{} posted message {} with {} attachment(s)",
        user.username,
        id,
        form.media_files.len()
    );

    Ok(done(&headers, &wall_url(&wall)))
}

/// Message and its wall, when `user` wrote the message.
fn authored(state: &AppState, id: &str, user: &CurrentUser) -> AppResult<(Message, MessageWall)> {
    let conn = state.db.get()?;
    let message = messages::find_authored(&conn, id, &user.id)?.ok_or(AppError::NotFound)?;
    let wall = walls::find(&conn, &message.wall_id)?.ok_or(AppError::NotFound)?;
    Ok((message, wall))
}

/// GET /message/{id}/edit/
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<MessageFormTemplate>> {
    let (message, wall) = authored(&state, &id, &user)?;
    let themes = {
        let conn = state.db.get()?;
        themes::list(&conn)?
    };

    Ok(Html(MessageFormTemplate {
        user: Some(user),
        wall,
        form: MessageForm::from_message(&message),
        message: Some(message),
        errors: FormErrors::default(),
        themes,
    }))
}

/// POST /message/{id}/edit/: new files are added to the existing attachments.
async fn edit_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let data = MultipartData::collect(multipart).await?;
    let form = MessageForm::from_multipart(&data);

    let (message, wall) = authored(&state, &id, &user)?;
    let themes = {
        let conn = state.db.get()?;
        themes::list(&conn)?
    };

    let input = match form.clean(&themes) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(rejected(
                &headers,
                MessageFormTemplate {
                    user: Some(user),
                    wall,
                    message: Some(message),
                    form,
                    errors,
                    themes,
                },
            ))
        }
    };

    store_message(
        &state,
        &user.id,
        Target::Existing { id: &message.id },
        &input,
        &form.media_files,
    )
    .await?;

    Ok(done(&headers, &wall_url(&wall)))
}

/// GET /message/{id}/delete/
async fn delete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<ConfirmDeleteTemplate>> {
    let (message, wall) = authored(&state, &id, &user)?;
    let name: String = message.content.chars().take(40).collect();

    Ok(Html(ConfirmDeleteTemplate {
        user: Some(user),
        kind: "message",
        name,
        action: format!("/message/{}/delete/", message.id),
        cancel_url: wall_url(&wall),
    }))
}

/// POST /message/{id}/delete/
async fn delete_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (message, wall) = authored(&state, &id, &user)?;
    {
        let conn = state.db.get()?;
        messages::delete(&conn, &message.id)?;
    }
    Ok(done(&headers, &wall_url(&wall)))
}
