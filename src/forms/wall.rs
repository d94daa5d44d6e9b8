use serde::Deserialize;

use crate::db::models::{MessageWall, Theme};
use crate::db::walls::WallInput;
use crate::forms::{checkbox, max_chars, required, theme_field, FormErrors};
use crate::slug;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WallForm {
    pub title: String,
    pub theme: String,
    pub is_public: Option<String>,
    pub custom_url: String,
}

impl WallForm {
    pub fn from_wall(wall: &MessageWall) -> Self {
        Self {
            title: wall.title.clone(),
            theme: wall.theme_id.clone().unwrap_or_default(),
            is_public: wall.is_public.then(|| "on".to_string()),
            custom_url: wall.custom_url.clone(),
        }
    }

    pub fn public_checked(&self) -> bool {
        checkbox(&self.is_public)
    }

    /// A blank address is derived from the title. Uniqueness is the caller's
    /// job since it needs the database.
    pub fn clean(&self, themes: &[Theme]) -> Result<WallInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if required(&mut errors, "title", title) {
            max_chars(&mut errors, "title", title, 100);
        }

        let theme_id = theme_field(&mut errors, &self.theme, themes);

        let custom_url = match self.custom_url.trim() {
            "" => slug::slugify(title),
            given => given.to_lowercase(),
        };
        if !errors.has("title") {
            if let Err(message) = slug::check(&custom_url) {
                errors.add("custom_url", message);
            }
        }

        errors.into_result(WallInput {
            title: title.to_string(),
            theme_id,
            is_public: self.public_checked(),
            custom_url,
        })
    }
}

pub const SLUG_TAKEN: &str = "Message wall with this Custom url already exists.";
