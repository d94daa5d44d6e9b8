use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::MessageWall;
use crate::db::new_id;

/// Validated wall fields, shared by create and edit.
#[derive(Debug, Clone)]
pub struct WallInput {
    pub title: String,
    pub theme_id: Option<String>,
    pub is_public: bool,
    pub custom_url: String,
}

/// Insert a wall. A taken `custom_url` surfaces as a UNIQUE violation.
pub fn create(conn: &Connection, owner_id: &str, input: &WallInput) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO message_walls (id, owner_id, title, theme_id, custom_url, is_public)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            owner_id,
            input.title,
            input.theme_id,
            input.custom_url,
            input.is_public
        ],
    )?;
    Ok(id)
}

pub fn update(conn: &Connection, id: &str, input: &WallInput) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE message_walls SET title = ?2, theme_id = ?3, custom_url = ?4, is_public = ?5
         WHERE id = ?1",
        params![
            id,
            input.title,
            input.theme_id,
            input.custom_url,
            input.is_public
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM message_walls WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<MessageWall>> {
    conn.query_row(
        &format!("{} WHERE w.id = ?1", MessageWall::SELECT),
        params![id],
        MessageWall::from_row,
    )
    .optional()
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<MessageWall>> {
    conn.query_row(
        &format!("{} WHERE w.custom_url = ?1", MessageWall::SELECT),
        params![slug],
        MessageWall::from_row,
    )
    .optional()
}

/// Wall by slug, but only when `owner_id` owns it.
pub fn find_owned(
    conn: &Connection,
    slug: &str,
    owner_id: &str,
) -> rusqlite::Result<Option<MessageWall>> {
    conn.query_row(
        &format!(
            "{} WHERE w.custom_url = ?1 AND w.owner_id = ?2",
            MessageWall::SELECT
        ),
        params![slug, owner_id],
        MessageWall::from_row,
    )
    .optional()
}

/// Whether `slug` belongs to a wall other than `except_wall`.
pub fn slug_taken(
    conn: &Connection,
    slug: &str,
    except_wall: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM message_walls WHERE custom_url = ?1 AND id != ?2",
        params![slug, except_wall.unwrap_or("")],
        |row| row.get(0),
    )
}

pub fn recent_public(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<MessageWall>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE w.is_public = 1 ORDER BY w.created_at DESC, w.id DESC LIMIT ?1",
        MessageWall::SELECT
    ))?;
    let walls = stmt
        .query_map(params![limit], MessageWall::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(walls)
}

pub fn list_by_owner(conn: &Connection, owner_id: &str) -> rusqlite::Result<Vec<MessageWall>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE w.owner_id = ?1 ORDER BY w.created_at DESC, w.id DESC",
        MessageWall::SELECT
    ))?;
    let walls = stmt
        .query_map(params![owner_id], MessageWall::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(walls)
}

pub fn count_by_owner(conn: &Connection, owner_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM message_walls WHERE owner_id = ?1",
        params![owner_id],
        |row| row.get(0),
    )
}
