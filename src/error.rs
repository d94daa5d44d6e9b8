use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// Carries the path to return to after logging in.
    #[error("Login required")]
    LoginRequired(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::LoginRequired(next) => {
                return Redirect::to(&login_url(next)).into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Multipart(e) => {
                tracing::warn!("Rejected multipart body: {}", e);
                (e.status(), e.body_text())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                internal()
            }
            AppError::Template(e) => {
                tracing::error!("Template render error: {}", e);
                internal()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Login page URL that returns to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let encoded: String = next
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'/' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!("/accounts/login/?next={}", encoded)
}

pub type AppResult<T> = Result<T, AppError>;
