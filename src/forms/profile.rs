use crate::db::models::UserProfile;
use crate::forms::multipart::{MultipartData, UploadedFile};
use crate::forms::personal::check_image;
use crate::forms::{max_chars, FormErrors};

pub const THEME_PREFERENCES: &[&str] = &["light", "dark", "system"];

#[derive(Debug, Default, Clone)]
pub struct ProfileForm {
    pub bio: String,
    pub location: String,
    pub website: String,
    pub display_email: bool,
    pub theme_preference: String,
    pub avatar: Option<UploadedFile>,
}

/// Cleaned profile fields; the avatar still needs storing.
#[derive(Debug)]
pub struct CleanProfile {
    pub bio: String,
    pub location: String,
    pub website: String,
    pub display_email: bool,
    pub theme_preference: String,
}

impl ProfileForm {
    pub fn from_multipart(data: &MultipartData) -> Self {
        Self {
            bio: data.text("bio"),
            location: data.text("location"),
            website: data.text("website"),
            display_email: data.checked("display_email"),
            theme_preference: data.text("theme_preference"),
            avatar: data.file("avatar"),
        }
    }

    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            website: profile.website.clone(),
            display_email: profile.display_email,
            theme_preference: profile.theme_preference.clone(),
            avatar: None,
        }
    }

    pub fn clean(&self) -> Result<CleanProfile, FormErrors> {
        let mut errors = FormErrors::default();

        max_chars(&mut errors, "bio", self.bio.trim(), 500);
        max_chars(&mut errors, "location", self.location.trim(), 100);

        let website = self.website.trim();
        max_chars(&mut errors, "website", website, 200);
        if !website.is_empty() && !is_http_url(website) {
            errors.add("website", "Enter a valid URL.");
        }

        let theme_preference = match self.theme_preference.trim() {
            "" => "light",
            pref => pref,
        };
        if !THEME_PREFERENCES.contains(&theme_preference) {
            errors.add(
                "theme_preference",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }

        if let Some(avatar) = &self.avatar {
            check_image(&mut errors, "avatar", avatar);
        }

        errors.into_result(CleanProfile {
            bio: self.bio.trim().to_string(),
            location: self.location.trim().to_string(),
            website: website.to_string(),
            display_email: self.display_email,
            theme_preference: theme_preference.to_string(),
        })
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
