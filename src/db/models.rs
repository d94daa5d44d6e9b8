use chrono::NaiveDate;
use rusqlite::Row;
use serde::Serialize;

use crate::media::MediaStore;
use crate::timefmt;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: String,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "id, username, email, first_name, last_name, password_hash, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            password_hash: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub avatar_path: Option<String>,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub birth_date: Option<String>,
    pub display_email: bool,
    pub theme_preference: String,
    pub notification_preferences: Vec<String>,
    pub privacy_settings: Vec<String>,
}

impl UserProfile {
    pub(crate) const COLUMNS: &'static str = "user_id, avatar_path, bio, location, website, \
         birth_date, display_email, theme_preference, notification_preferences, privacy_settings";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(UserProfile {
            user_id: row.get(0)?,
            avatar_path: row.get(1)?,
            bio: row.get(2)?,
            location: row.get(3)?,
            website: row.get(4)?,
            birth_date: row.get(5)?,
            display_email: row.get(6)?,
            theme_preference: row.get(7)?,
            notification_preferences: split_list(&row.get::<_, String>(8)?),
            privacy_settings: split_list(&row.get::<_, String>(9)?),
        })
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatar_path.as_deref().map(MediaStore::url)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub background_music: Option<String>,
    pub background_image: Option<String>,
}

impl Theme {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Theme {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            background_music: row.get(3)?,
            background_image: row.get(4)?,
        })
    }

    pub fn music_url(&self) -> Option<String> {
        self.background_music.as_deref().map(MediaStore::url)
    }

    pub fn image_url(&self) -> Option<String> {
        self.background_image.as_deref().map(MediaStore::url)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageWall {
    pub id: String,
    pub owner_id: String,
    pub owner_username: String,
    pub title: String,
    pub theme_id: Option<String>,
    pub custom_url: String,
    pub is_public: bool,
    pub created_at: String,
}

impl MessageWall {
    pub(crate) const SELECT: &'static str = "SELECT w.id, w.owner_id, u.username, w.title, \
         w.theme_id, w.custom_url, w.is_public, w.created_at \
         FROM message_walls w JOIN users u ON u.id = w.owner_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MessageWall {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            owner_username: row.get(2)?,
            title: row.get(3)?,
            theme_id: row.get(4)?,
            custom_url: row.get(5)?,
            is_public: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub wall_id: String,
    pub wall_url: String,
    pub author_id: String,
    pub author_username: String,
    pub recipient_id: String,
    pub content: String,
    pub theme_id: Option<String>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub background_color: String,
    pub font_style: String,
    pub category: Option<String>,
    pub is_featured: bool,
    pub position: Option<i64>,
    pub created_at: String,
    pub attachments: Vec<MediaAttachment>,
}

impl Message {
    pub(crate) const SELECT: &'static str = "SELECT m.id, m.wall_id, w.custom_url, m.author_id, \
         u.username, m.recipient_id, m.content, m.theme_id, m.is_public, m.is_anonymous, \
         m.background_color, m.font_style, m.category, m.is_featured, m.position, m.created_at \
         FROM messages m \
         JOIN users u ON u.id = m.author_id \
         JOIN message_walls w ON w.id = m.wall_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Message {
            id: row.get(0)?,
            wall_id: row.get(1)?,
            wall_url: row.get(2)?,
            author_id: row.get(3)?,
            author_username: row.get(4)?,
            recipient_id: row.get(5)?,
            content: row.get(6)?,
            theme_id: row.get(7)?,
            is_public: row.get(8)?,
            is_anonymous: row.get(9)?,
            background_color: row.get(10)?,
            font_style: row.get(11)?,
            category: row.get(12)?,
            is_featured: row.get(13)?,
            position: row.get(14)?,
            created_at: row.get(15)?,
            attachments: Vec::new(),
        })
    }

    /// Name shown for the author; anonymous messages hide it from everyone else.
    pub fn author_label(&self, viewer_id: Option<&str>) -> String {
        if self.is_anonymous && viewer_id != Some(self.author_id.as_str()) {
            "Anonymous".to_string()
        } else {
            self.author_username.clone()
        }
    }

    pub fn is_authored_by(&self, viewer_id: Option<&str>) -> bool {
        viewer_id == Some(self.author_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaAttachment {
    pub id: String,
    pub message_id: Option<String>,
    pub uploader_id: String,
    pub file_path: String,
    pub kind: String,
    pub created_at: String,
}

impl MediaAttachment {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MediaAttachment {
            id: row.get(0)?,
            message_id: row.get(1)?,
            uploader_id: row.get(2)?,
            file_path: row.get(3)?,
            kind: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn url(&self) -> String {
        MediaStore::url(&self.file_path)
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// One memory on a user's timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub image_path: String,
    pub created_at: String,
}

impl TimelineEntry {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, title, description, date, image_path, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(TimelineEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            date: row.get(4)?,
            image_path: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn image_url(&self) -> String {
        MediaStore::url(&self.image_path)
    }

    pub fn display_date(&self) -> String {
        timefmt::long_date(self.date)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialDate {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub reminder: bool,
    pub created_at: String,
}

impl SpecialDate {
    pub(crate) const COLUMNS: &'static str = "id, user_id, title, date, reminder, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SpecialDate {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            date: row.get(3)?,
            reminder: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn display_date(&self) -> String {
        timefmt::long_date(self.date)
    }
}

pub(crate) fn split_list(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn join_list(values: &[String]) -> String {
    values.join(",")
}
