use askama::Template;

use crate::db::models::Message;
use crate::extractors::CurrentUser;
use crate::timefmt;

/// A message as one viewer sees it.
pub struct MessageCard {
    pub message: Message,
    pub author: String,
    pub can_edit: bool,
    pub created: String,
}

impl MessageCard {
    pub fn new(message: Message, viewer_id: Option<&str>) -> Self {
        Self {
            author: message.author_label(viewer_id),
            can_edit: message.is_authored_by(viewer_id),
            created: timefmt::posted(&message.created_at),
            message,
        }
    }
}

pub fn cards(messages: Vec<Message>, viewer_id: Option<&str>) -> Vec<MessageCard> {
    messages
        .into_iter()
        .map(|m| MessageCard::new(m, viewer_id))
        .collect()
}

/// One checkbox in a multi-select preference form.
pub struct Choice {
    pub key: String,
    pub label: String,
    pub checked: bool,
}

pub fn choices(all: &[(&str, &str)], selected: &[String]) -> Vec<Choice> {
    all.iter()
        .map(|(key, label)| Choice {
            key: key.to_string(),
            label: label.to_string(),
            checked: selected.iter().any(|s| s == key),
        })
        .collect()
}

/// Shared "are you sure" page for every owner-only delete.
#[derive(Template)]
#[template(path = "pages/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub user: Option<CurrentUser>,
    pub kind: &'static str,
    pub name: String,
    pub action: String,
    pub cancel_url: String,
}
