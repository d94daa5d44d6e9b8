use askama::Template;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::messages::{self, MessageFilter};
use crate::db::models::{MessageWall, SpecialDate, User, UserProfile};
use crate::db::users::{self, ProfileChanges};
use crate::db::{special_dates, timeline, walls};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::forms::account::{
    clean_choices, AccountDeletionForm, PasswordChangeForm, SettingsForm, NOTIFICATION_CHOICES,
    PRIVACY_CHOICES,
};
use crate::forms::multipart::MultipartData;
use crate::forms::profile::{ProfileForm, THEME_PREFERENCES};
use crate::forms::FormErrors;
use crate::media::AVATARS_DIR;
use crate::routes::home::Html;
use crate::routes::views::{cards, choices, Choice, MessageCard};
use crate::state::AppState;

const PROFILE_PREVIEW: i64 = 5;
const RECENT_ACTIVITY: i64 = 10;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub account: User,
    pub profile: UserProfile,
    pub walls: Vec<MessageWall>,
    pub received: Vec<MessageCard>,
    pub sent: Vec<MessageCard>,
    pub special_dates: Vec<SpecialDate>,
    pub updated: bool,
}

#[derive(Template)]
#[template(path = "pages/profile_edit.html")]
pub struct ProfileEditTemplate {
    pub user: Option<CurrentUser>,
    pub profile: UserProfile,
    pub form: ProfileForm,
    pub errors: FormErrors,
    pub theme_preferences: &'static [&'static str],
}

impl ProfileEditTemplate {
    pub fn is_selected(&self, pref: &str) -> bool {
        self.form.theme_preference == pref
    }
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub user: Option<CurrentUser>,
    pub walls_count: i64,
    pub messages_count: i64,
    pub received_count: i64,
    pub timeline_count: i64,
    pub recent_activity: Vec<MessageCard>,
}

#[derive(Template)]
#[template(path = "pages/settings.html")]
pub struct SettingsTemplate {
    pub user: Option<CurrentUser>,
    pub form: SettingsForm,
    pub errors: FormErrors,
    pub updated: bool,
}

#[derive(Template)]
#[template(path = "pages/password_change.html")]
pub struct PasswordChangeTemplate {
    pub user: Option<CurrentUser>,
    pub errors: FormErrors,
}

/// Notification and privacy preferences share one checkbox page.
#[derive(Template)]
#[template(path = "pages/preferences.html")]
pub struct PreferencesTemplate {
    pub user: Option<CurrentUser>,
    pub heading: &'static str,
    pub action: &'static str,
    pub field: &'static str,
    pub choices: Vec<Choice>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/account_delete.html")]
pub struct AccountDeleteTemplate {
    pub user: Option<CurrentUser>,
    pub errors: FormErrors,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatedQuery {
    pub updated: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/profile/", get(profile))
        .route("/users/profile/edit/", get(profile_edit_page).post(profile_edit))
        .route("/users/dashboard/", get(dashboard))
        .route("/users/settings/", get(settings_page).post(settings))
        .route(
            "/users/settings/password/",
            get(password_page).post(password_change),
        )
        .route(
            "/users/settings/notifications/",
            get(notifications_page).post(notifications),
        )
        .route(
            "/users/settings/privacy/",
            get(privacy_page).post(privacy),
        )
        .route("/users/delete/", get(delete_page).post(delete_account))
}

fn account(state: &AppState, user: &CurrentUser) -> AppResult<User> {
    let conn = state.db.get()?;
    users::find_by_id(&conn, &user.id)?.ok_or(AppError::NotFound)
}

// -- Profile --

/// GET /users/profile/
async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UpdatedQuery>,
) -> AppResult<Html<ProfileTemplate>> {
    let viewer = Some(user.id.as_str());
    let conn = state.db.get()?;

    let account = users::find_by_id(&conn, &user.id)?.ok_or(AppError::NotFound)?;
    let profile = users::ensure_profile(&conn, &user.id)?;
    let walls = walls::list_by_owner(&conn, &user.id)?;
    let received = messages::list(
        &conn,
        &MessageFilter::ReceivedBy(&user.id),
        PROFILE_PREVIEW,
        0,
    )?;
    let sent = messages::list(
        &conn,
        &MessageFilter::AuthoredBy(&user.id),
        PROFILE_PREVIEW,
        0,
    )?;
    let special_dates = special_dates::list_for_user(&conn, &user.id, Some(PROFILE_PREVIEW))?;

    Ok(Html(ProfileTemplate {
        received: cards(received, viewer),
        sent: cards(sent, viewer),
        user: Some(user.clone()),
        account,
        profile,
        walls,
        special_dates,
        updated: query.updated.is_some(),
    }))
}

/// GET /users/profile/edit/
async fn profile_edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<ProfileEditTemplate>> {
    let profile = {
        let conn = state.db.get()?;
        users::ensure_profile(&conn, &user.id)?
    };

    Ok(Html(ProfileEditTemplate {
        user: Some(user),
        form: ProfileForm::from_profile(&profile),
        profile,
        errors: FormErrors::default(),
        theme_preferences: THEME_PREFERENCES,
    }))
}

/// POST /users/profile/edit/: a new avatar replaces the stored one.
async fn profile_edit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let data = MultipartData::collect(multipart).await?;
    let form = ProfileForm::from_multipart(&data);

    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => {
            let profile = {
                let conn = state.db.get()?;
                users::ensure_profile(&conn, &user.id)?
            };
            return Ok(Html(ProfileEditTemplate {
                user: Some(user),
                profile,
                form,
                errors,
                theme_preferences: THEME_PREFERENCES,
            })
            .into_response());
        }
    };

    let avatar_path = match &form.avatar {
        Some(avatar) => Some(state.media.save(AVATARS_DIR, avatar).await?),
        None => None,
    };

    let changes = ProfileChanges {
        bio: clean.bio,
        location: clean.location,
        website: clean.website,
        display_email: clean.display_email,
        theme_preference: clean.theme_preference,
        avatar_path,
    };
    if let Err(e) = save_profile(&state, &user.id, &changes) {
        if let Some(path) = changes.avatar_path {
            state.media.discard(&[path]).await;
        }
        return Err(e);
    }

    Ok(Redirect::to("/users/profile/?updated=1").into_response())
}

fn save_profile(state: &AppState, user_id: &str, changes: &ProfileChanges) -> AppResult<()> {
    let conn = state.db.get()?;
    users::ensure_profile(&conn, user_id)?;
    users::update_profile(&conn, user_id, changes)?;
    Ok(())
}

/// GET /users/dashboard/
async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<DashboardTemplate>> {
    let conn = state.db.get()?;
    let recent = messages::list(
        &conn,
        &MessageFilter::ReceivedBy(&user.id),
        RECENT_ACTIVITY,
        0,
    )?;

    Ok(Html(DashboardTemplate {
        walls_count: walls::count_by_owner(&conn, &user.id)?,
        messages_count: messages::count(&conn, &MessageFilter::AuthoredBy(&user.id))?,
        received_count: messages::count(&conn, &MessageFilter::ReceivedBy(&user.id))?,
        timeline_count: timeline::count_for_user(&conn, &user.id)?,
        recent_activity: cards(recent, Some(user.id.as_str())),
        user: Some(user.clone()),
    }))
}

// -- Settings --

/// GET /users/settings/
async fn settings_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UpdatedQuery>,
) -> AppResult<Html<SettingsTemplate>> {
    let account = account(&state, &user)?;
    Ok(Html(SettingsTemplate {
        user: Some(user),
        form: SettingsForm {
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        },
        errors: FormErrors::default(),
        updated: query.updated.is_some(),
    }))
}

/// POST /users/settings/: the email must stay unique across accounts.
async fn settings(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<SettingsForm>,
) -> AppResult<Response> {
    let rerender = |user: CurrentUser, form: SettingsForm, errors: FormErrors| {
        Html(SettingsTemplate {
            user: Some(user),
            form,
            errors,
            updated: false,
        })
        .into_response()
    };

    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => return Ok(rerender(user, form, errors)),
    };

    let conn = state.db.get()?;
    if users::email_taken(&conn, &clean.email, Some(&user.id))? {
        let mut errors = FormErrors::default();
        errors.add("email", "This email address is already in use.");
        return Ok(rerender(user, form, errors));
    }
    users::update_settings(
        &conn,
        &user.id,
        &clean.email,
        &clean.first_name,
        &clean.last_name,
    )?;

    Ok(Redirect::to("/users/settings/?updated=1").into_response())
}

/// GET /users/settings/password/
async fn password_page(user: CurrentUser) -> Html<PasswordChangeTemplate> {
    Html(PasswordChangeTemplate {
        user: Some(user),
        errors: FormErrors::default(),
    })
}

/// POST /users/settings/password/: existing sessions stay valid.
async fn password_change(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PasswordChangeForm>,
) -> AppResult<Response> {
    let account = account(&state, &user)?;
    let new_password =
        match form.clean(|candidate| password::verify_password(candidate, &account.password_hash))
        {
            Ok(new_password) => new_password,
            Err(errors) => {
                return Ok(Html(PasswordChangeTemplate {
                    user: Some(user),
                    errors,
                })
                .into_response())
            }
        };

    let hash = password::hash_password(&new_password, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
    {
        let conn = state.db.get()?;
        users::update_password(&conn, &user.id, &hash)?;
    }
    tracing::info!("{} changed their password", user.username);

    Ok(Redirect::to("/users/settings/?updated=1").into_response())
}

// -- Notification and privacy preferences --

struct PreferenceKind {
    heading: &'static str,
    action: &'static str,
    field: &'static str,
    all: &'static [(&'static str, &'static str)],
}

const NOTIFICATIONS: PreferenceKind = PreferenceKind {
    heading: "Notification settings",
    action: "/users/settings/notifications/",
    field: "notification_preferences",
    all: NOTIFICATION_CHOICES,
};

const PRIVACY: PreferenceKind = PreferenceKind {
    heading: "Privacy settings",
    action: "/users/settings/privacy/",
    field: "privacy_settings",
    all: PRIVACY_CHOICES,
};

fn preferences_page(
    kind: &PreferenceKind,
    user: CurrentUser,
    selected: &[String],
    errors: FormErrors,
) -> Html<PreferencesTemplate> {
    Html(PreferencesTemplate {
        user: Some(user),
        heading: kind.heading,
        action: kind.action,
        field: kind.field,
        choices: choices(kind.all, selected),
        errors,
    })
}

fn current_preferences(
    state: &AppState,
    user: &CurrentUser,
    kind: &PreferenceKind,
) -> AppResult<Vec<String>> {
    let conn = state.db.get()?;
    let profile = users::ensure_profile(&conn, &user.id)?;
    Ok(if kind.field == NOTIFICATIONS.field {
        profile.notification_preferences
    } else {
        profile.privacy_settings
    })
}

fn save_preferences(
    state: &AppState,
    user: CurrentUser,
    kind: &PreferenceKind,
    pairs: &[(String, String)],
) -> AppResult<Response> {
    let chosen = match clean_choices(pairs, kind.field, kind.all) {
        Ok(chosen) => chosen,
        Err(errors) => {
            let submitted: Vec<String> = pairs.iter().map(|(_, v)| v.clone()).collect();
            return Ok(preferences_page(kind, user, &submitted, errors).into_response());
        }
    };

    let conn = state.db.get()?;
    users::ensure_profile(&conn, &user.id)?;
    if kind.field == NOTIFICATIONS.field {
        users::set_notification_preferences(&conn, &user.id, &chosen)?;
    } else {
        users::set_privacy_settings(&conn, &user.id, &chosen)?;
    }

    Ok(Redirect::to("/users/settings/?updated=1").into_response())
}

async fn notifications_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PreferencesTemplate>> {
    let selected = current_preferences(&state, &user, &NOTIFICATIONS)?;
    Ok(preferences_page(&NOTIFICATIONS, user, &selected, FormErrors::default()))
}

async fn notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    save_preferences(&state, user, &NOTIFICATIONS, &pairs)
}

async fn privacy_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PreferencesTemplate>> {
    let selected = current_preferences(&state, &user, &PRIVACY)?;
    Ok(preferences_page(&PRIVACY, user, &selected, FormErrors::default()))
}

async fn privacy(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    save_preferences(&state, user, &PRIVACY, &pairs)
}

// -- Account deletion --

/// GET /users/delete/
async fn delete_page(user: CurrentUser) -> Html<AccountDeleteTemplate> {
    Html(AccountDeleteTemplate {
        user: Some(user),
        errors: FormErrors::default(),
    })
}

/// POST /users/delete/: everything the user owns goes with the account.
async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<AccountDeletionForm>,
) -> AppResult<Response> {
    let account = account(&state, &user)?;
    if let Err(errors) =
        form.clean(|candidate| password::verify_password(candidate, &account.password_hash))
    {
        return Ok(Html(AccountDeleteTemplate {
            user: Some(user),
            errors,
        })
        .into_response());
    }

    {
        let conn = state.db.get()?;
        users::delete_user(&conn, &user.id)?;
    }
    tracing::info!("Deleted account {}", user.username);

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session::clear_session_cookie(&state.config.auth.cookie_name),
        )]),
        Redirect::to("/"),
    )
        .into_response())
}
