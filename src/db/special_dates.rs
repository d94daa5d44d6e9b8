use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::SpecialDate;
use crate::db::new_id;

#[derive(Debug, Clone)]
pub struct SpecialDateInput {
    pub title: String,
    pub date: NaiveDate,
    pub reminder: bool,
}

pub fn create(conn: &Connection, user_id: &str, input: &SpecialDateInput) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO special_dates (id, user_id, title, date, reminder) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, user_id, input.title, input.date, input.reminder],
    )?;
    Ok(id)
}

pub fn update(conn: &Connection, id: &str, input: &SpecialDateInput) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE special_dates SET title = ?2, date = ?3, reminder = ?4 WHERE id = ?1",
        params![id, input.title, input.date, input.reminder],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM special_dates WHERE id = ?1", params![id])?;
    Ok(())
}

/// Earliest date first, optionally capped.
pub fn list_for_user(
    conn: &Connection,
    user_id: &str,
    limit: Option<i64>,
) -> rusqlite::Result<Vec<SpecialDate>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM special_dates WHERE user_id = ?1 ORDER BY date ASC, id ASC LIMIT ?2",
        SpecialDate::COLUMNS
    ))?;
    let dates = stmt
        .query_map(params![user_id, limit.unwrap_or(-1)], SpecialDate::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dates)
}

pub fn find_owned(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> rusqlite::Result<Option<SpecialDate>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM special_dates WHERE id = ?1 AND user_id = ?2",
            SpecialDate::COLUMNS
        ),
        params![id, user_id],
        SpecialDate::from_row,
    )
    .optional()
}
