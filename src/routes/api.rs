//! JSON endpoints used by the wall page's scripts.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::db::{media, messages};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::forms::multipart::MultipartData;
use crate::media::{MediaKind, MediaStore, ATTACHMENTS_DIR, MAX_FILE_SIZE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PositionUpdate {
    message_id: String,
    position: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/update-message-position/",
            post(update_message_position).fallback(bad_request),
        )
        .route(
            "/api/upload-media/",
            post(upload_media).fallback(bad_request),
        )
}

fn status(code: StatusCode, status: &str) -> Response {
    (code, Json(json!({ "status": status }))).into_response()
}

async fn bad_request() -> Response {
    status(StatusCode::BAD_REQUEST, "error")
}

/// POST /api/update-message-position/
///
/// Unlike the HTML pages, a message owned by someone else answers 403 here
/// rather than 404.
async fn update_message_position(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> AppResult<Response> {
    let update: PositionUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::debug!("Rejected position update: {}", e);
            return Ok(status(StatusCode::BAD_REQUEST, "error"));
        }
    };

    let conn = state.db.get()?;
    let Some(message) = messages::find(&conn, &update.message_id)? else {
        return Ok(status(StatusCode::NOT_FOUND, "error"));
    };
    if message.author_id != user.id {
        return Ok(status(StatusCode::FORBIDDEN, "error"));
    }

    messages::set_position(&conn, &message.id, update.position)?;
    Ok(status(StatusCode::OK, "success"))
}

/// POST /api/upload-media/: stores one file, not yet attached to a message.
///
/// Bodies that are not readable multipart answer with the JSON error shape.
async fn upload_media(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::debug!("Rejected upload body: {}", e);
            return Ok(status(StatusCode::BAD_REQUEST, "error"));
        }
    };
    let data = match MultipartData::collect(multipart).await {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Rejected upload body: {}", e);
            return Ok(status(StatusCode::BAD_REQUEST, "error"));
        }
    };
    let Some(file) = data.file("file") else {
        return Ok(status(StatusCode::BAD_REQUEST, "error"));
    };
    if file.size() > MAX_FILE_SIZE {
        return Ok(status(StatusCode::BAD_REQUEST, "error"));
    }

    let path = state.media.save(ATTACHMENTS_DIR, &file).await?;
    if let Err(e) = record_upload(&state, &user.id, &path, &file.file_name) {
        state.media.discard(&[path]).await;
        return Err(e);
    }

    Ok(Json(json!({
        "status": "success",
        "file_url": MediaStore::url(&path),
    }))
    .into_response())
}

fn record_upload(
    state: &AppState,
    uploader_id: &str,
    path: &str,
    file_name: &str,
) -> AppResult<()> {
    let conn = state.db.get()?;
    media::create(
        &conn,
        None,
        uploader_id,
        path,
        MediaKind::from_file_name(file_name),
    )?;
    Ok(())
}
