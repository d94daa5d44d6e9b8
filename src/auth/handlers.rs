use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::{self, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::account::{safe_next, LoginForm, SignupForm};
use crate::forms::FormErrors;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub user: Option<CurrentUser>,
    pub form: SignupForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub form: LoginForm,
    pub error: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct NextQuery {
    pub next: String,
}

/// Redirect to `target` with a fresh session cookie for `user_id`.
fn start_session(state: &AppState, user_id: &str, target: &str) -> AppResult<Response> {
    let token = {
        let conn = state.db.get()?;
        session::create_session(&conn, user_id, state.config.auth.session_hours)?
    };
    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(target),
    )
        .into_response())
}

// -- Signup --

/// GET /accounts/signup/
pub async fn signup_page(MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/users/dashboard/").into_response();
    }
    Html(SignupTemplate {
        user: None,
        form: SignupForm::default(),
        errors: FormErrors::default(),
    })
    .into_response()
}

/// POST /accounts/signup/: create the account and its profile, then log in.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let rerender = |form: SignupForm, errors: FormErrors| -> AppResult<Response> {
        Ok(Html(SignupTemplate {
            user: None,
            form: form.redacted(),
            errors,
        })
        .into_response())
    };

    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => return rerender(form, errors),
    };

    {
        let conn = state.db.get()?;
        let mut errors = FormErrors::default();
        if users::username_exists(&conn, &clean.username)? {
            errors.add("username", "A user with that username already exists.");
        }
        if users::email_taken(&conn, &clean.email, None)? {
            errors.add("email", "This email address is already in use.");
        }
        if !errors.is_empty() {
            return rerender(form, errors);
        }
    }

    let password_hash = password::hash_password(&clean.password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

    let created = {
        let mut conn = state.db.get()?;
        users::create_user(
            &mut conn,
            &users::NewUser {
                username: clean.username.clone(),
                email: clean.email,
                first_name: clean.first_name,
                last_name: clean.last_name,
                password_hash,
                birth_date: Some(clean.birth_date),
            },
        )
    };

    let user_id = match created {
        Ok(id) => id,
        // Lost a race with another signup for the same name or address.
        Err(e) if db::is_unique_violation(&e) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username or email already exists.");
            return rerender(form, errors);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("New account: {}", clean.username);
    start_session(&state, &user_id, "/users/dashboard/")
}

// -- Login / logout --

/// GET /accounts/login/
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Response {
    if user.is_some() {
        let target = safe_next(&query.next).unwrap_or("/users/dashboard/");
        return Redirect::to(target).into_response();
    }
    Html(LoginTemplate {
        user: None,
        form: LoginForm {
            next: query.next,
            ..Default::default()
        },
        error: None,
    })
    .into_response()
}

/// POST /accounts/login/
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let found = {
        let conn = state.db.get()?;
        users::find_by_username(&conn, form.username.trim())?
    };

    match found {
        Some(user) if password::verify_password(&form.password, &user.password_hash) => {
            start_session(&state, &user.id, form.redirect_target())
        }
        _ => {
            tracing::debug!("Failed login for {}", form.username);
            Ok(Html(LoginTemplate {
                user: None,
                form: LoginForm {
                    password: String::new(),
                    ..form
                },
                error: Some(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .to_string(),
                ),
            })
            .into_response())
        }
    }
}

/// POST /accounts/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = session::get_cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie(cookie_name))]),
        Redirect::to("/"),
    )
        .into_response())
}
