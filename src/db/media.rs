use rusqlite::{params, Connection};

use crate::db::models::MediaAttachment;
use crate::db::new_id;
use crate::media::MediaKind;

const SELECT: &str =
    "SELECT id, message_id, uploader_id, file_path, kind, created_at FROM media_attachments";

/// Record a stored file. `message_id` is `None` for standalone uploads.
pub fn create(
    conn: &Connection,
    message_id: Option<&str>,
    uploader_id: &str,
    file_path: &str,
    kind: MediaKind,
) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO media_attachments (id, message_id, uploader_id, file_path, kind)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, message_id, uploader_id, file_path, kind.as_str()],
    )?;
    Ok(id)
}

pub fn list_for_message(
    conn: &Connection,
    message_id: &str,
) -> rusqlite::Result<Vec<MediaAttachment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE message_id = ?1 ORDER BY created_at, id",
        SELECT
    ))?;
    let attachments = stmt
        .query_map(params![message_id], MediaAttachment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(attachments)
}
