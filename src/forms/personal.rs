//! Timeline memories and special dates: the owner-only personal records.

use serde::Deserialize;

use crate::db::models::{SpecialDate, TimelineEntry};
use crate::db::special_dates::SpecialDateInput;
use crate::db::timeline::TimelineInput;
use crate::forms::multipart::{MultipartData, UploadedFile};
use crate::forms::{checkbox, date_field, max_chars, required, FormErrors};
use crate::media::{is_image_name, MAX_FILE_SIZE};
use crate::timefmt::FORM_DATE;

#[derive(Debug, Default, Clone)]
pub struct TimelineForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub image: Option<UploadedFile>,
}

impl TimelineForm {
    pub fn from_multipart(data: &MultipartData) -> Self {
        Self {
            title: data.text("title"),
            description: data.text("description"),
            date: data.text("date"),
            image: data.file("image"),
        }
    }

    pub fn from_entry(entry: &TimelineEntry) -> Self {
        Self {
            title: entry.title.clone(),
            description: entry.description.clone(),
            date: entry.date.format(FORM_DATE).to_string(),
            image: None,
        }
    }

    /// `image_required` is true when creating; edits may keep the old image.
    pub fn clean(&self, image_required: bool) -> Result<TimelineInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if required(&mut errors, "title", title) {
            max_chars(&mut errors, "title", title, 100);
        }
        required(&mut errors, "description", &self.description);
        let date = date_field(&mut errors, "date", &self.date);

        match &self.image {
            Some(image) => check_image(&mut errors, "image", image),
            None if image_required => errors.add("image", "This field is required."),
            None => {}
        }

        match date {
            Some(date) if errors.is_empty() => Ok(TimelineInput {
                title: title.to_string(),
                description: self.description.trim().to_string(),
                date,
            }),
            _ => Err(errors),
        }
    }
}

/// Size and extension checks shared by timeline images and avatars.
pub fn check_image(errors: &mut FormErrors, field: &str, image: &UploadedFile) {
    if image.size() > MAX_FILE_SIZE {
        errors.add(field, "Image file size must be less than 5MB.");
    }
    if !is_image_name(&image.file_name) {
        errors.add(
            field,
            "Please upload a valid image file (jpg, jpeg, png, gif).",
        );
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SpecialDateForm {
    pub title: String,
    pub date: String,
    pub reminder: Option<String>,
}

impl SpecialDateForm {
    pub fn from_date(date: &SpecialDate) -> Self {
        Self {
            title: date.title.clone(),
            date: date.date.format(FORM_DATE).to_string(),
            reminder: date.reminder.then(|| "on".to_string()),
        }
    }

    pub fn reminder_checked(&self) -> bool {
        checkbox(&self.reminder)
    }

    pub fn clean(&self) -> Result<SpecialDateInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if required(&mut errors, "title", title) {
            max_chars(&mut errors, "title", title, 100);
        }
        let date = date_field(&mut errors, "date", &self.date);

        match date {
            Some(date) if errors.is_empty() => Ok(SpecialDateInput {
                title: title.to_string(),
                date,
                reminder: self.reminder_checked(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::NaiveDate;

    fn image(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            field: "image".into(),
            file_name: name.into(),
            data: Bytes::from(vec![1u8; size]),
        }
    }

    fn timeline(image: Option<UploadedFile>) -> TimelineForm {
        TimelineForm {
            title: "First trip".into(),
            description: "Porto in the rain".into(),
            date: "2021-03-12".into(),
            image,
        }
    }

    #[test]
    fn timeline_requires_image_on_create_only() {
        assert!(timeline(None).clean(true).unwrap_err().has("image"));
        let input = timeline(None).clean(false).unwrap();
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2021, 3, 12).unwrap());
        assert!(timeline(Some(image("porto.JPG", 2048))).clean(true).is_ok());
    }

    #[test]
    fn timeline_image_must_be_small_picture() {
        let errors = timeline(Some(image("porto.bmp", 6 * 1024 * 1024)))
            .clean(true)
            .unwrap_err();
        assert_eq!(errors.get("image").len(), 2);
    }

    #[test]
    fn special_date_reminder_checkbox() {
        let form = SpecialDateForm {
            title: "Anniversary".into(),
            date: "2025-06-21".into(),
            reminder: Some("on".into()),
        };
        let input = form.clean().unwrap();
        assert!(input.reminder);

        let form = SpecialDateForm {
            reminder: None,
            ..form
        };
        assert!(!form.clean().unwrap().reminder);
    }

    #[test]
    fn special_date_needs_valid_date() {
        let form = SpecialDateForm {
            title: "Someday".into(),
            date: "soon".into(),
            reminder: None,
        };
        assert_eq!(form.clean().unwrap_err().get("date"), ["Enter a valid date."]);
    }
}
