use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{join_list, User, UserProfile};
use crate::db::new_id;

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub birth_date: Option<NaiveDate>,
}

pub struct ProfileChanges {
    pub bio: String,
    pub location: String,
    pub website: String,
    pub display_email: bool,
    pub theme_preference: String,
    /// `Some` replaces the stored avatar; `None` keeps it.
    pub avatar_path: Option<String>,
}

/// Create a user and its profile in one transaction. Returns the new user id.
pub fn create_user(conn: &mut Connection, new: &NewUser) -> rusqlite::Result<String> {
    let id = new_id();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO users (id, username, email, first_name, last_name, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            new.username,
            new.email,
            new.first_name,
            new.last_name,
            new.password_hash
        ],
    )?;
    tx.execute(
        "INSERT INTO user_profiles (user_id, birth_date) VALUES (?1, ?2)",
        params![id, new.birth_date],
    )?;
    tx.commit()?;
    Ok(id)
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        params![id],
        User::from_row,
    )
    .optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
        params![username],
        User::from_row,
    )
    .optional()
}

pub fn username_exists(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 COLLATE NOCASE",
        params![username],
        |row| row.get(0),
    )
}

/// Whether another account already uses `email`. `except_user` is ignored in the check.
pub fn email_taken(
    conn: &Connection,
    email: &str,
    except_user: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1 COLLATE NOCASE AND id != ?2",
        params![email, except_user.unwrap_or("")],
        |row| row.get(0),
    )
}

pub fn update_settings(
    conn: &Connection,
    user_id: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET email = ?2, first_name = ?3, last_name = ?4 WHERE id = ?1",
        params![user_id, email, first_name, last_name],
    )?;
    Ok(())
}

pub fn update_password(conn: &Connection, user_id: &str, hash: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        params![user_id, hash],
    )?;
    Ok(())
}

/// Delete a user. Walls, messages, media, timeline entries, special dates,
/// sessions and the profile go with it through ON DELETE CASCADE.
pub fn delete_user(conn: &Connection, user_id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    Ok(rows > 0)
}

pub fn get_profile(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<UserProfile>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM user_profiles WHERE user_id = ?1",
            UserProfile::COLUMNS
        ),
        params![user_id],
        UserProfile::from_row,
    )
    .optional()
}

/// Profile for `user_id`, creating an empty one first for accounts that predate it.
pub fn ensure_profile(conn: &Connection, user_id: &str) -> rusqlite::Result<UserProfile> {
    conn.execute(
        "INSERT OR IGNORE INTO user_profiles (user_id) VALUES (?1)",
        params![user_id],
    )?;
    get_profile(conn, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn update_profile(
    conn: &Connection,
    user_id: &str,
    changes: &ProfileChanges,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE user_profiles
         SET bio = ?2, location = ?3, website = ?4, display_email = ?5,
             theme_preference = ?6, avatar_path = COALESCE(?7, avatar_path)
         WHERE user_id = ?1",
        params![
            user_id,
            changes.bio,
            changes.location,
            changes.website,
            changes.display_email,
            changes.theme_preference,
            changes.avatar_path
        ],
    )?;
    Ok(())
}

pub fn set_notification_preferences(
    conn: &Connection,
    user_id: &str,
    choices: &[String],
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE user_profiles SET notification_preferences = ?2 WHERE user_id = ?1",
        params![user_id, join_list(choices)],
    )?;
    Ok(())
}

pub fn set_privacy_settings(
    conn: &Connection,
    user_id: &str,
    choices: &[String],
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE user_profiles SET privacy_settings = ?2 WHERE user_id = ?1",
        params![user_id, join_list(choices)],
    )?;
    Ok(())
}
