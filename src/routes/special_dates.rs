use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::db::models::SpecialDate;
use crate::db::special_dates;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::forms::personal::SpecialDateForm;
use crate::forms::FormErrors;
use crate::routes::home::Html;
use crate::routes::views::ConfirmDeleteTemplate;
use crate::state::AppState;

const LIST_URL: &str = "/special-dates/";

#[derive(Template)]
#[template(path = "pages/special_dates.html")]
pub struct SpecialDatesTemplate {
    pub user: Option<CurrentUser>,
    pub dates: Vec<SpecialDate>,
}

#[derive(Template)]
#[template(path = "pages/special_date_form.html")]
pub struct SpecialDateFormTemplate {
    pub user: Option<CurrentUser>,
    pub date: Option<SpecialDate>,
    pub form: SpecialDateForm,
    pub errors: FormErrors,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_URL, get(list_dates))
        .route("/special-dates/create/", get(create_page).post(create_date))
        .route("/special-dates/{id}/edit/", get(edit_page).post(edit_date))
        .route(
            "/special-dates/{id}/delete/",
            get(delete_page).post(delete_date),
        )
}

fn owned_date(state: &AppState, id: &str, user: &CurrentUser) -> AppResult<SpecialDate> {
    let conn = state.db.get()?;
    special_dates::find_owned(&conn, id, &user.id)?.ok_or(AppError::NotFound)
}

/// GET /special-dates/: soonest first.
async fn list_dates(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<SpecialDatesTemplate>> {
    let dates = {
        let conn = state.db.get()?;
        special_dates::list_for_user(&conn, &user.id, None)?
    };
    Ok(Html(SpecialDatesTemplate {
        user: Some(user),
        dates,
    }))
}

async fn create_page(user: CurrentUser) -> Html<SpecialDateFormTemplate> {
    Html(SpecialDateFormTemplate {
        user: Some(user),
        date: None,
        form: SpecialDateForm::default(),
        errors: FormErrors::default(),
    })
}

async fn create_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<SpecialDateForm>,
) -> AppResult<Response> {
    match form.clean() {
        Ok(input) => {
            let conn = state.db.get()?;
            special_dates::create(&conn, &user.id, &input)?;
            Ok(Redirect::to(LIST_URL).into_response())
        }
        Err(errors) => Ok(Html(SpecialDateFormTemplate {
            user: Some(user),
            date: None,
            form,
            errors,
        })
        .into_response()),
    }
}

async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<SpecialDateFormTemplate>> {
    let date = owned_date(&state, &id, &user)?;
    Ok(Html(SpecialDateFormTemplate {
        user: Some(user),
        form: SpecialDateForm::from_date(&date),
        date: Some(date),
        errors: FormErrors::default(),
    }))
}

async fn edit_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<SpecialDateForm>,
) -> AppResult<Response> {
    let date = owned_date(&state, &id, &user)?;
    match form.clean() {
        Ok(input) => {
            let conn = state.db.get()?;
            special_dates::update(&conn, &date.id, &input)?;
            Ok(Redirect::to(LIST_URL).into_response())
        }
        Err(errors) => Ok(Html(SpecialDateFormTemplate {
            user: Some(user),
            date: Some(date),
            form,
            errors,
        })
        .into_response()),
    }
}

async fn delete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<ConfirmDeleteTemplate>> {
    let date = owned_date(&state, &id, &user)?;
    Ok(Html(ConfirmDeleteTemplate {
        user: Some(user),
        kind: "special date",
        action: format!("/special-dates/{}/delete/", date.id),
        cancel_url: LIST_URL.to_string(),
        name: date.title,
    }))
}

async fn delete_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let date = owned_date(&state, &id, &user)?;
    let conn = state.db.get()?;
    special_dates::delete(&conn, &date.id)?;
    Ok(Redirect::to(LIST_URL))
}
