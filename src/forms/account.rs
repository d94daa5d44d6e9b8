use chrono::NaiveDate;
use serde::Deserialize;

use crate::forms::{checkbox, date_field, max_chars, required, FormErrors};

pub const MIN_PASSWORD_LEN: usize = 8;

pub const NOTIFICATION_CHOICES: &[(&str, &str)] = &[
    ("email_messages", "Email notifications for new messages"),
    ("email_wall_activity", "Email notifications for wall activity"),
    ("email_special_dates", "Email reminders for special dates"),
    ("browser_notifications", "Browser notifications"),
    ("mobile_notifications", "Mobile notifications"),
];

pub const PRIVACY_CHOICES: &[(&str, &str)] = &[
    ("show_email", "Show email to other users"),
    ("show_full_name", "Show full name to other users"),
    ("show_location", "Show location to other users"),
    ("allow_messages", "Allow messages from non-friends"),
    ("public_profile", "Make profile public"),
    ("show_online_status", "Show online status"),
];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug)]
pub struct CleanSignup {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub password: String,
}

impl SignupForm {
    /// Shape checks only; the handler adds the uniqueness checks.
    pub fn clean(&self) -> Result<CleanSignup, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if required(&mut errors, "username", username) {
            max_chars(&mut errors, "username", username, 150);
            if !is_valid_username(username) {
                errors.add(
                    "username",
                    "Username can only contain letters, numbers, and underscores.",
                );
            }
        }

        let email = self.email.trim();
        if required(&mut errors, "email", email) && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if required(&mut errors, field, value) {
                max_chars(&mut errors, field, value.trim(), 30);
            }
        }

        let birth_date = date_field(&mut errors, "birth_date", &self.birth_date);
        check_new_password(&mut errors, "password2", &self.password1, &self.password2);

        match birth_date {
            Some(birth_date) if errors.is_empty() => Ok(CleanSignup {
                username: username.to_string(),
                email: email.to_string(),
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                birth_date,
                password: self.password1.clone(),
            }),
            _ => Err(errors),
        }
    }

    /// The form as it should be re-rendered: never echo passwords back.
    pub fn redacted(mut self) -> Self {
        self.password1.clear();
        self.password2.clear();
        self
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

impl LoginForm {
    /// Where to go after logging in. Only local paths are honoured.
    pub fn redirect_target(&self) -> &str {
        safe_next(&self.next).unwrap_or("/users/dashboard/")
    }
}

/// `next` if it is a path on this site, `None` for anything that could leave it.
pub fn safe_next(next: &str) -> Option<&str> {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    local.then_some(next)
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl SettingsForm {
    pub fn clean(&self) -> Result<SettingsForm, FormErrors> {
        let mut errors = FormErrors::default();
        let email = self.email.trim();
        if required(&mut errors, "email", email) && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        max_chars(&mut errors, "first_name", self.first_name.trim(), 30);
        max_chars(&mut errors, "last_name", self.last_name.trim(), 30);
        errors.into_result(SettingsForm {
            email: email.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

impl PasswordChangeForm {
    /// Returns the new password. `verify` checks a candidate against the current one.
    pub fn clean(&self, verify: impl Fn(&str) -> bool) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        if required(&mut errors, "old_password", &self.old_password) && !verify(&self.old_password)
        {
            errors.add(
                "old_password",
                "Your old password was entered incorrectly. Please enter it again.",
            );
        }
        check_new_password(
            &mut errors,
            "new_password2",
            &self.new_password1,
            &self.new_password2,
        );
        errors.into_result(self.new_password1.clone())
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AccountDeletionForm {
    pub confirmation: Option<String>,
    pub password: String,
}

impl AccountDeletionForm {
    pub fn clean(&self, verify: impl Fn(&str) -> bool) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if !checkbox(&self.confirmation) {
            errors.add("confirmation", "This field is required.");
        }
        if required(&mut errors, "password", &self.password) && !verify(&self.password) {
            errors.add("password", "Incorrect password. Please try again.");
        }
        errors.into_result(())
    }
}

/// Keep the submitted values of `field` that are known choices; any unknown
/// value rejects the whole submission.
pub fn clean_choices(
    pairs: &[(String, String)],
    field: &str,
    allowed: &[(&str, &str)],
) -> Result<Vec<String>, FormErrors> {
    let mut errors = FormErrors::default();
    let mut chosen: Vec<String> = Vec::new();

    for (_, value) in pairs.iter().filter(|(name, _)| name == field) {
        if !allowed.iter().any(|(key, _)| key == value) {
            errors.add(
                field,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    value
                ),
            );
        } else if !chosen.contains(value) {
            chosen.push(value.clone());
        }
    }

    errors.into_result(chosen)
}

fn check_new_password(errors: &mut FormErrors, field: &str, password1: &str, password2: &str) {
    if password1.is_empty() {
        errors.add("password1", "This field is required.");
        return;
    }
    if password1 != password2 {
        errors.add(field, "The two password fields didn\u{2019}t match.");
        return;
    }
    if password1.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            "This password is too short. It must contain at least 8 characters.",
        );
    }
    if password1.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
