use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::models::Message;
use crate::db::{media, new_id};

/// Validated message fields, shared by create and edit.
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub content: String,
    pub theme_id: Option<String>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub background_color: String,
    pub font_style: String,
    pub category: Option<String>,
}

/// Which messages a listing shows. Every variant orders newest first.
#[derive(Debug, Clone, Copy)]
pub enum MessageFilter<'a> {
    /// Messages on a wall that are public, plus the viewer's own.
    Wall {
        wall_id: &'a str,
        viewer_id: Option<&'a str>,
    },
    Public,
    Featured,
    /// Public messages whose content or (non-anonymous) author name contains the term.
    Search(&'a str),
    Category(&'a str),
    ReceivedBy(&'a str),
    AuthoredBy(&'a str),
}

impl MessageFilter<'_> {
    fn where_clause(&self) -> (&'static str, Vec<String>) {
        match *self {
            MessageFilter::Wall { wall_id, viewer_id } => (
                "m.wall_id = ? AND (m.is_public = 1 OR m.author_id = ?)",
                vec![wall_id.to_string(), viewer_id.unwrap_or("").to_string()],
            ),
            MessageFilter::Public => ("m.is_public = 1", Vec::new()),
            MessageFilter::Featured => ("m.is_public = 1 AND m.is_featured = 1", Vec::new()),
            MessageFilter::Search(term) => {
                let pattern = like_pattern(term);
                (
                    "m.is_public = 1 AND (m.content LIKE ? ESCAPE '\\' \
                     OR (m.is_anonymous = 0 AND u.username LIKE ? ESCAPE '\\'))",
                    vec![pattern.clone(), pattern],
                )
            }
            MessageFilter::Category(category) => (
                "m.is_public = 1 AND m.category = ?",
                vec![category.to_string()],
            ),
            MessageFilter::ReceivedBy(user_id) => ("m.recipient_id = ?", vec![user_id.to_string()]),
            MessageFilter::AuthoredBy(user_id) => ("m.author_id = ?", vec![user_id.to_string()]),
        }
    }
}

/// `%term%` with LIKE wildcards in the term taken literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub fn count(conn: &Connection, filter: &MessageFilter<'_>) -> rusqlite::Result<i64> {
    let (clause, args) = filter.where_clause();
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM messages m JOIN users u ON u.id = m.author_id WHERE {}",
            clause
        ),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )
}

/// One slice of a listing, attachments included.
pub fn list(
    conn: &Connection,
    filter: &MessageFilter<'_>,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<Message>> {
    let (clause, args) = filter.where_clause();
    let sql = format!(
        "{} WHERE {} ORDER BY m.created_at DESC, m.id DESC LIMIT {} OFFSET {}",
        Message::SELECT,
        clause,
        limit.max(0),
        offset.max(0)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut messages = stmt
        .query_map(params_from_iter(args.iter()), Message::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for message in &mut messages {
        message.attachments = media::list_for_message(conn, &message.id)?;
    }
    Ok(messages)
}

pub fn create(
    conn: &Connection,
    wall_id: &str,
    author_id: &str,
    recipient_id: &str,
    input: &MessageInput,
) -> rusqlite::Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO messages (id, wall_id, author_id, recipient_id, content, theme_id,
                               is_public, is_anonymous, background_color, font_style, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            wall_id,
            author_id,
            recipient_id,
            input.content,
            input.theme_id,
            input.is_public,
            input.is_anonymous,
            input.background_color,
            input.font_style,
            input.category
        ],
    )?;
    Ok(id)
}

pub fn update(conn: &Connection, id: &str, input: &MessageInput) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE messages
         SET content = ?2, theme_id = ?3, is_public = ?4, is_anonymous = ?5,
             background_color = ?6, font_style = ?7, category = ?8
         WHERE id = ?1",
        params![
            id,
            input.content,
            input.theme_id,
            input.is_public,
            input.is_anonymous,
            input.background_color,
            input.font_style,
            input.category
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
    Ok(())
}

pub fn set_position(conn: &Connection, id: &str, position: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE messages SET position = ?2 WHERE id = ?1",
        params![id, position],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> rusqlite::Result<Option<Message>> {
    let message = conn
        .query_row(
            &format!("{} WHERE m.id = ?1", Message::SELECT),
            params![id],
            Message::from_row,
        )
        .optional()?;
    with_attachments(conn, message)
}

/// Message by id, but only when `author_id` wrote it.
pub fn find_authored(
    conn: &Connection,
    id: &str,
    author_id: &str,
) -> rusqlite::Result<Option<Message>> {
    let message = conn
        .query_row(
            &format!("{} WHERE m.id = ?1 AND m.author_id = ?2", Message::SELECT),
            params![id, author_id],
            Message::from_row,
        )
        .optional()?;
    with_attachments(conn, message)
}

fn with_attachments(
    conn: &Connection,
    message: Option<Message>,
) -> rusqlite::Result<Option<Message>> {
    match message {
        Some(mut message) => {
            message.attachments = media::list_for_message(conn, &message.id)?;
            Ok(Some(message))
        }
        None => Ok(None),
    }
}
