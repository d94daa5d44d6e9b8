use serde::Deserialize;

pub const PAGE_SIZE: i64 = 12;

/// `?page=N` query string. Kept as text so junk values fall back to page 1
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Position within a listing, resolved before the slice is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub per_page: i64,
}

impl Paginator {
    /// Missing, non-numeric or non-positive pages give page 1; pages past the
    /// end give the last page. An empty listing still has one (empty) page.
    pub fn new(requested: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = if total <= 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        let number = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(num_pages))
            .unwrap_or(1);

        Self {
            number,
            num_pages,
            total: total.max(0),
            per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> i64 {
        (self.number - 1).max(1)
    }

    pub fn next_number(&self) -> i64 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
