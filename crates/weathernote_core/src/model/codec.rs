//! Conversion between notifications and store documents.
//!
//! # Responsibility
//! - Encode unsaved notifications into the field map written on insert.
//! - Decode listed documents into notifications for the local list.
//!
//! # Invariants
//! - `encode` never validates and never writes the record id.
//! - `decode` never fails: absent or malformed fields are normalized
//!   (`""` for text, `Info` for type, Unix epoch for a missing, non-timestamp
//!   or out-of-range date).

use crate::model::document::{Document, DocumentFields, FieldValue, StoreTimestamp};
use crate::model::notification::{Notification, NotificationKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_DATE: &str = "date";
pub const FIELD_TYPE: &str = "type";
/// Server-assigned sort key; only meaningful store-side.
pub const FIELD_CREATED_AT: &str = "createdAt";

/// Builds the field map persisted for a new notification.
pub fn encode(notification: &Notification) -> DocumentFields {
    let mut fields = DocumentFields::new();
    fields.insert(
        FIELD_TITLE.to_string(),
        FieldValue::String(notification.title.clone()),
    );
    fields.insert(
        FIELD_DESCRIPTION.to_string(),
        FieldValue::String(notification.description.clone()),
    );
    fields.insert(
        FIELD_DATE.to_string(),
        FieldValue::Timestamp(calendar_to_timestamp(notification.date)),
    );
    fields.insert(
        FIELD_TYPE.to_string(),
        FieldValue::String(notification.kind.as_str().to_string()),
    );
    fields.insert(FIELD_CREATED_AT.to_string(), FieldValue::ServerTimestamp);
    fields
}

/// Maps one listed document into a persisted notification.
pub fn decode(document: &Document) -> Notification {
    let date = document
        .get(FIELD_DATE)
        .and_then(FieldValue::as_timestamp)
        .and_then(timestamp_to_calendar)
        .unwrap_or_else(|| {
            warn!(
                "event=notification_decode module=model status=normalized field=date doc_id={}",
                document.id
            );
            DateTime::<Utc>::UNIX_EPOCH.naive_utc()
        });

    let kind = document
        .get(FIELD_TYPE)
        .and_then(FieldValue::as_str)
        .map(NotificationKind::from_literal)
        .unwrap_or_default();

    Notification {
        id: Some(document.id.clone().into()),
        title: text_field(document, FIELD_TITLE),
        description: text_field(document, FIELD_DESCRIPTION),
        date,
        kind,
    }
}

/// Converts an operator calendar value into store precision.
///
/// Sub-millisecond precision is truncated.
pub fn calendar_to_timestamp(date: NaiveDateTime) -> StoreTimestamp {
    date.and_utc().timestamp_millis()
}

/// Converts a store timestamp back into a calendar value.
///
/// Returns `None` when the value is outside the representable range.
pub fn timestamp_to_calendar(timestamp: StoreTimestamp) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(timestamp).map(|value| value.naive_utc())
}

fn text_field(document: &Document, field: &str) -> String {
    document
        .get(field)
        .and_then(FieldValue::as_str)
        .unwrap_or_default()
        .to_string()
}
