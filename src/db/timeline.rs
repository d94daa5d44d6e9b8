use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::TimelineEntry;
use crate::db::new_id;

#[derive(Debug, Clone)]
pub struct TimelineInput {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
}

pub fn create(
    conn: &Connection,
    user_id: &str,
    input: &TimelineInput,
    image_path: &str,
) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO timelines (id, user_id, title, description, date, image_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, user_id, input.title, input.description, input.date, image_path],
    )?;
    Ok(id)
}

/// Update an entry; `image_path` replaces the image only when given.
pub fn update(
    conn: &Connection,
    id: &str,
    input: &TimelineInput,
    image_path: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE timelines
         SET title = ?2, description = ?3, date = ?4, image_path = COALESCE(?5, image_path)
         WHERE id = ?1",
        params![id, input.title, input.description, input.date, image_path],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM timelines WHERE id = ?1", params![id])?;
    Ok(())
}

/// Newest memories first.
pub fn list_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<TimelineEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM timelines WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        TimelineEntry::COLUMNS
    ))?;
    let entries = stmt
        .query_map(params![user_id], TimelineEntry::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn find_owned(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> rusqlite::Result<Option<TimelineEntry>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM timelines WHERE id = ?1 AND user_id = ?2",
            TimelineEntry::COLUMNS
        ),
        params![id, user_id],
        TimelineEntry::from_row,
    )
    .optional()
}

pub fn count_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM timelines WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}
