use axum::http::{header, HeaderMap};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: &str, hours: u64) -> rusqlite::Result<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// `(user_id, username)` for a live session.
pub fn lookup(conn: &Connection, token: &str) -> rusqlite::Result<Option<(String, String)>> {
    conn.query_row(
        "SELECT u.id, u.username FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn purge_expired(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// -- Cookie helpers --

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name,
        token,
        max_age_hours * 3600
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{migrated_pool, user};
    use axum::http::HeaderValue;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn session_lifecycle() {
        let pool = migrated_pool();
        let mut conn = pool.get().unwrap();
        let alice = user(&mut conn, "alice");

        let token = create_session(&conn, &alice, 1).unwrap();
        assert_eq!(
            lookup(&conn, &token).unwrap(),
            Some((alice.clone(), "alice".to_string()))
        );

        delete_session(&conn, &token).unwrap();
        assert_eq!(lookup(&conn, &token).unwrap(), None);
    }

    #[test]
    fn expired_sessions_are_ignored_and_purged() {
        let pool = migrated_pool();
        let mut conn = pool.get().unwrap();
        let alice = user(&mut conn, "alice");
        let token = create_session(&conn, &alice, 1).unwrap();
        conn.execute(
            "UPDATE sessions SET expires_at = datetime('now', '-1 hours')",
            [],
        )
        .unwrap();

        assert_eq!(lookup(&conn, &token).unwrap(), None);
        assert_eq!(purge_expired(&conn).unwrap(), 1);
    }

    #[test]
    fn reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; lovewall_session=abc123"),
        );
        assert_eq!(get_cookie_value(&headers, "lovewall_session"), Some("abc123"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }
}
