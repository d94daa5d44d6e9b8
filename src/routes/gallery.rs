use askama::Template;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::messages::{self, MessageFilter};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::pagination::{Page, PageQuery, Paginator, PAGE_SIZE};
use crate::routes::home::Html;
use crate::routes::views::{cards, MessageCard};
use crate::state::AppState;

/// Every public listing renders through this one page.
#[derive(Template)]
#[template(path = "pages/gallery.html")]
pub struct GalleryTemplate {
    pub user: Option<CurrentUser>,
    pub heading: String,
    /// Search box contents; empty outside search.
    pub query: String,
    pub page: Page<MessageCard>,
    /// Path the pagination links point at.
    pub base_path: String,
}

impl GalleryTemplate {
    pub fn is_search(&self) -> bool {
        self.base_path == "/search/"
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gallery/", get(gallery))
        .route("/gallery/featured/", get(featured))
        .route("/search/", get(search))
        .route("/filter/{category}/", get(filter_by_category))
}

fn listing(
    state: &AppState,
    user: Option<CurrentUser>,
    filter: MessageFilter<'_>,
    page: Option<&str>,
    heading: String,
    query: String,
    base_path: String,
) -> AppResult<Html<GalleryTemplate>> {
    let viewer = user.as_ref().map(|u| u.id.as_str());
    let conn = state.db.get()?;
    let total = messages::count(&conn, &filter)?;
    let paginator = Paginator::new(page, total, PAGE_SIZE);
    let items = messages::list(&conn, &filter, PAGE_SIZE, paginator.offset())?;

    Ok(Html(GalleryTemplate {
        page: paginator.page(cards(items, viewer)),
        user,
        heading,
        query,
        base_path,
    }))
}

/// GET /gallery/
async fn gallery(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GalleryTemplate>> {
    listing(
        &state,
        user,
        MessageFilter::Public,
        query.page.as_deref(),
        "Gallery".to_string(),
        String::new(),
        "/gallery/".to_string(),
    )
}

/// GET /gallery/featured/
async fn featured(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GalleryTemplate>> {
    listing(
        &state,
        user,
        MessageFilter::Featured,
        query.page.as_deref(),
        "Featured messages".to_string(),
        String::new(),
        "/gallery/featured/".to_string(),
    )
}

/// GET /search/?q=term
///
/// A blank query matches every public message.
async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<GalleryTemplate>> {
    let term = query.q.trim().to_string();
    let heading = if term.is_empty() {
        "Search".to_string()
    } else {
        format!("Results for \u{201c}{}\u{201d}", term)
    };

    tracing::debug!("Searching messages for {:?}", term);
    listing(
        &state,
        user,
        MessageFilter::Search(&term),
        query.page.as_deref(),
        heading,
        term.clone(),
        "/search/".to_string(),
    )
}

/// GET /filter/{category}/
async fn filter_by_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(category): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<GalleryTemplate>> {
    listing(
        &state,
        user,
        MessageFilter::Category(&category),
        query.page.as_deref(),
        format!("Category: {}", category),
        String::new(),
        format!("/filter/{}/", path_segment(&category)),
    )
}

/// Percent-encode everything but unreserved characters so a category
/// survives as a single path segment.
fn path_segment(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
