use crate::db::messages::MessageInput;
use crate::db::models::{Message, Theme};
use crate::forms::multipart::{MultipartData, UploadedFile};
use crate::forms::{max_chars, required, theme_field, FormErrors};
use crate::media::MAX_FILE_SIZE;

pub const DEFAULT_COLOR: &str = "#ffffff";
pub const DEFAULT_FONT: &str = "Arial";
pub const FILE_TOO_LARGE: &str = "Each file must be less than 5MB";

/// Message form, submitted as multipart so attachments can ride along.
#[derive(Debug, Clone)]
pub struct MessageForm {
    pub content: String,
    pub theme: String,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub background_color: String,
    pub font_style: String,
    pub category: String,
    pub media_files: Vec<UploadedFile>,
}

impl Default for MessageForm {
    fn default() -> Self {
        Self {
            content: String::new(),
            theme: String::new(),
            is_public: false,
            is_anonymous: false,
            background_color: DEFAULT_COLOR.to_string(),
            font_style: DEFAULT_FONT.to_string(),
            category: String::new(),
            media_files: Vec::new(),
        }
    }
}

impl MessageForm {
    pub fn from_multipart(data: &MultipartData) -> Self {
        Self {
            content: data.text("content"),
            theme: data.text("theme"),
            is_public: data.checked("is_public"),
            is_anonymous: data.checked("is_anonymous"),
            background_color: data.text("background_color"),
            font_style: data.text("font_style"),
            category: data.text("category"),
            media_files: data.files("media_files"),
        }
    }

    pub fn from_message(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            theme: message.theme_id.clone().unwrap_or_default(),
            is_public: message.is_public,
            is_anonymous: message.is_anonymous,
            background_color: message.background_color.clone(),
            font_style: message.font_style.clone(),
            category: message.category.clone().unwrap_or_default(),
            media_files: Vec::new(),
        }
    }

    pub fn clean(&self, themes: &[Theme]) -> Result<MessageInput, FormErrors> {
        let mut errors = FormErrors::default();

        required(&mut errors, "content", &self.content);
        let theme_id = theme_field(&mut errors, &self.theme, themes);

        let background_color = match self.background_color.trim() {
            "" => DEFAULT_COLOR.to_string(),
            color if is_hex_color(color) => color.to_lowercase(),
            _ => {
                errors.add("background_color", "Enter a color like #ffcc00.");
                String::new()
            }
        };

        let font_style = match self.font_style.trim() {
            "" => DEFAULT_FONT.to_string(),
            font => font.to_string(),
        };
        max_chars(&mut errors, "font_style", &font_style, 50);

        let category = self.category.trim();
        max_chars(&mut errors, "category", category, 50);

        check_files(&mut errors, "media_files", &self.media_files);

        errors.into_result(MessageInput {
            content: self.content.trim().to_string(),
            theme_id,
            is_public: self.is_public,
            is_anonymous: self.is_anonymous,
            background_color,
            font_style,
            category: (!category.is_empty()).then(|| category.to_string()),
        })
    }
}

/// Per-file size limit; every file is checked, one message is enough.
pub fn check_files(errors: &mut FormErrors, field: &str, files: &[UploadedFile]) {
    if files.iter().any(|f| f.size() > MAX_FILE_SIZE) {
        errors.add(field, FILE_TOO_LARGE);
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
