//! Weather notification domain model.
//!
//! # Responsibility
//! - Define the notification record rendered by the admin screen.
//! - Define operator form input and its submission preconditions.
//!
//! # Invariants
//! - `id` is `None` only for records that were never persisted.
//! - Once assigned by the store, `id` never changes for that record.
//! - `date` is operator-chosen and carries no timezone normalization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque store-assigned identifier of a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-valued classification shown next to each notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Severe weather; rendered with warning styling.
    Warning,
    /// Everything else. Also the decode fallback for unknown literals.
    #[default]
    Info,
}

impl NotificationKind {
    /// Stored literal for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Maps a stored literal to a kind. Only `"warning"` is special.
    pub fn from_literal(value: &str) -> Self {
        if value == "warning" {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

/// Weather notification as held in the local list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Store-assigned identity; absent before first insert.
    pub id: Option<NotificationId>,
    pub title: String,
    pub description: String,
    /// Calendar timestamp picked by the operator.
    pub date: NaiveDateTime,
    /// Serialized as `type` to match the stored field name.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Notification {
    /// Creates an unsaved notification.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDateTime,
        kind: NotificationKind,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            date,
            kind,
        }
    }

    /// Returns whether the store has assigned an identity to this record.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Submission precondition failures for the create form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    EmptyTitle,
    EmptyDescription,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
        }
    }
}

impl Error for FormError {}

/// Operator input collected by the create form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationForm {
    pub title: String,
    pub description: String,
    pub date: NaiveDateTime,
    pub kind: NotificationKind,
}

impl NotificationForm {
    /// Checks submission preconditions.
    ///
    /// Whitespace-only input counts as empty. Title is checked first.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(FormError::EmptyDescription);
        }
        Ok(())
    }

    /// Builds the unsaved record, trimming surrounding whitespace.
    pub fn into_notification(self) -> Notification {
        Notification::new(
            self.title.trim(),
            self.description.trim(),
            self.date,
            self.kind,
        )
    }
}
