use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Theme;

const SELECT: &str =
    "SELECT id, name, description, background_music, background_image FROM themes";

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Theme>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT))?;
    let themes = stmt
        .query_map([], Theme::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(themes)
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<Theme>> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT),
        params![id],
        Theme::from_row,
    )
    .optional()
}
