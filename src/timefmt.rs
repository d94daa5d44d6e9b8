use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

/// Layout of `datetime('now')` values stored by SQLite.
pub const DB_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of `<input type="date">` values.
pub const FORM_DATE: &str = "%Y-%m-%d";

/// "February 14, 2024": timeline entries and special dates.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// When a message card was posted, as seen right now.
pub fn posted(created_at: &str) -> String {
    posted_at(created_at, Utc::now().naive_utc())
}

/// Recent posts read as elapsed time, older ones as a short date. The year
/// is dropped for posts from the current year. Unparseable input is returned as-is.
pub fn posted_at(created_at: &str, now: NaiveDateTime) -> String {
    let Ok(dt) = NaiveDateTime::parse_from_str(created_at, DB_TIMESTAMP) else {
        return created_at.to_string();
    };

    let elapsed = now.signed_duration_since(dt);
    // Clock skew can put fresh rows slightly in the future.
    if elapsed.num_seconds() < 60 {
        return "just now".to_string();
    }
    if elapsed.num_minutes() < 60 {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed.num_hours() < 24 {
        return plural(elapsed.num_hours(), "hour");
    }
    if now.date().pred_opt() == Some(dt.date()) {
        return "yesterday".to_string();
    }

    if dt.year() == now.year() {
        dt.format("%b %-d").to_string()
    } else {
        dt.format("%b %-d, %Y").to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
