//! Input validation for every form the site accepts.
//!
//! Each form keeps the raw submitted strings (so a failed submission can be
//! re-rendered as typed) and exposes a `clean` step that either yields the
//! typed input for the query layer or a set of per-field messages.

pub mod account;
pub mod message;
pub mod multipart;
pub mod personal;
pub mod profile;
pub mod wall;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::timefmt::FORM_DATE;

/// Field name to error messages, rendered next to the offending input.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Checked state of an HTML checkbox: browsers omit unchecked boxes entirely.
pub fn checkbox(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|v| !matches!(v, "" | "false" | "0" | "off"))
        .unwrap_or(false)
}

pub(crate) fn required(errors: &mut FormErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
        false
    } else {
        true
    }
}

pub(crate) fn max_chars(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

/// Parse an `<input type="date">` value.
pub(crate) fn date_field(errors: &mut FormErrors, field: &str, value: &str) -> Option<NaiveDate> {
    if !required(errors, field, value) {
        return None;
    }
    match NaiveDate::parse_from_str(value.trim(), FORM_DATE) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Enter a valid date.");
            None
        }
    }
}

/// Optional theme choice: blank means none, anything else must name a known theme.
pub(crate) fn theme_field(
    errors: &mut FormErrors,
    value: &str,
    themes: &[crate::db::models::Theme],
) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if themes.iter().any(|t| t.id == value) {
        Some(value.to_string())
    } else {
        errors.add(
            "theme",
            "Select a valid choice. That choice is not one of the available choices.",
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_collect_per_field() {
        let mut errors = FormErrors::default();
        assert!(errors.is_empty());
        errors.add("title", "first");
        errors.add("title", "second");
        assert!(errors.has("title"));
        assert_eq!(errors.get("title"), ["first", "second"]);
        assert!(errors.get("date").is_empty());
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn checkbox_states() {
        assert!(checkbox(&Some("on".into())));
        assert!(checkbox(&Some("true".into())));
        assert!(!checkbox(&Some("".into())));
        assert!(!checkbox(&Some("false".into())));
        assert!(!checkbox(&None));
    }

    #[test]
    fn date_field_parses_iso_dates() {
        let mut errors = FormErrors::default();
        assert_eq!(
            date_field(&mut errors, "date", "2024-02-14"),
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
        assert!(errors.is_empty());

        assert_eq!(date_field(&mut errors, "date", "14/02/2024"), None);
        assert_eq!(errors.get("date"), ["Enter a valid date."]);
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let mut errors = FormErrors::default();
        max_chars(&mut errors, "title", &"é".repeat(100), 100);
        assert!(errors.is_empty());
        max_chars(&mut errors, "title", &"x".repeat(101), 100);
        assert!(errors.has("title"));
    }
}
