//! FFI use-case API for the Flutter admin screen.
//!
//! # Responsibility
//! - Expose load/create/delete flows to Dart via FRB.
//! - Fold every outcome into an envelope with a human-readable status
//!   message for the screen's transient notice.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - One controller exists per process; its mutex serializes all
//!   state-changing calls.
//! - Every envelope carries the list as it stands after the call, also on
//!   failure.
//! - `notifications_snapshot` never waits on the controller mutex.

use log::warn;
use once_cell::sync::OnceCell;
use std::sync::{Mutex, MutexGuard};
use weathernote_core::model::codec::{calendar_to_timestamp, timestamp_to_calendar};
use weathernote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_collection,
    ping as ping_inner, LoadingFlag, Notification, NotificationForm, NotificationId,
    NotificationKind, SqliteCollection, StoreConfig, SyncController,
};

type Controller = SyncController<SqliteCollection>;

static CONTROLLER: OnceCell<Mutex<Controller>> = OnceCell::new();
static LOADING: OnceCell<LoadingFlag> = OnceCell::new();
/// List state published after every controller call, read by snapshots.
static PUBLISHED: Mutex<Vec<NotificationItem>> = Mutex::new(Vec::new());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is idempotent.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One row of the notification list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Operator-chosen date as epoch milliseconds, no timezone applied.
    pub date_epoch_ms: i64,
    /// `warning|info`.
    pub kind: String,
}

/// Current list state plus the outcome of the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationListResponse {
    pub ok: bool,
    pub items: Vec<NotificationItem>,
    pub loading: bool,
    pub message: String,
}

/// Outcome of a create or delete action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationActionResponse {
    pub ok: bool,
    /// Created or deleted notification id, when known.
    pub notification_id: Option<String>,
    pub message: String,
    /// List state after the action, including any reconciling refresh.
    pub items: Vec<NotificationItem>,
}

impl NotificationActionResponse {
    fn success(message: impl Into<String>, id: &NotificationId, controller: &Controller) -> Self {
        Self {
            ok: true,
            notification_id: Some(id.to_string()),
            message: message.into(),
            items: to_items(controller.notifications()),
        }
    }

    fn failure(message: impl Into<String>, controller: &Controller) -> Self {
        Self {
            ok: false,
            notification_id: None,
            message: message.into(),
            items: to_items(controller.notifications()),
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            ok: false,
            notification_id: None,
            message,
            items: Vec::new(),
        }
    }
}

/// Loads (or reloads) the notification list from the collection.
///
/// # FFI contract
/// - Async call; FRB runs it on a worker thread so the screen can poll
///   `notifications_snapshot` for `loading` meanwhile.
/// - On failure `items` holds the previous list.
pub fn notifications_load() -> NotificationListResponse {
    let mut controller = match lock_controller() {
        Ok(controller) => controller,
        Err(message) => return list_failure(message),
    };

    let (ok, message) = match controller.refresh() {
        Ok(count) => (true, format!("Loaded {count} notification(s).")),
        Err(err) => (false, err.to_string()),
    };
    let items = publish(&controller);
    NotificationListResponse {
        ok,
        items,
        loading: controller.is_loading(),
        message,
    }
}

/// Returns the last published list and the live loading flag.
///
/// # FFI contract
/// - Sync call; never blocks on an in-flight load, create or delete.
/// - Before the first controller call the list is empty.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_snapshot() -> NotificationListResponse {
    let items = match PUBLISHED.lock() {
        Ok(items) => items.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    NotificationListResponse {
        ok: true,
        items,
        loading: loading_flag().is_loading(),
        message: String::new(),
    }
}

/// Creates a notification from form input, then reloads the list.
///
/// Input semantics:
/// - `title`/`description`: must be non-blank; trimmed before storing.
/// - `date_epoch_ms`: operator-chosen date.
/// - `kind`: `warning` selects warning, anything else is `info`.
///
/// A stored record whose reload failed is still `ok`; the message then
/// also carries the load failure.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_create(
    title: String,
    description: String,
    date_epoch_ms: i64,
    kind: String,
) -> NotificationActionResponse {
    with_controller(|controller| {
        let Some(date) = timestamp_to_calendar(date_epoch_ms) else {
            return NotificationActionResponse::failure(
                format!("Cannot create notification: date {date_epoch_ms} is out of range"),
                controller,
            );
        };
        let form = NotificationForm {
            title,
            description,
            date,
            kind: NotificationKind::from_literal(kind.trim()),
        };

        match controller.submit(form) {
            Ok(outcome) => {
                let message = match &outcome.reload {
                    None => "Notification created.".to_string(),
                    Some(err) => format!("Notification created. {err}"),
                };
                NotificationActionResponse::success(message, &outcome.id, controller)
            }
            Err(err) => NotificationActionResponse::failure(err.to_string(), controller),
        }
    })
}

/// Deletes the notification with the given id.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_delete(id: String) -> NotificationActionResponse {
    with_controller(|controller| {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return NotificationActionResponse::failure(
                "Cannot delete notification: missing id",
                controller,
            );
        }
        let id = NotificationId::new(trimmed);
        match controller.delete(&id) {
            Ok(()) => NotificationActionResponse::success("Notification deleted.", &id, controller),
            Err(err) => NotificationActionResponse::failure(err.to_string(), controller),
        }
    })
}

/// Deletes the notification at a list position.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_delete_at(index: u32) -> NotificationActionResponse {
    with_controller(|controller| {
        match controller.delete_at(index as usize) {
            Ok(id) => NotificationActionResponse::success("Notification deleted.", &id, controller),
            Err(err) => NotificationActionResponse::failure(err.to_string(), controller),
        }
    })
}

fn with_controller(
    action: impl FnOnce(&mut Controller) -> NotificationActionResponse,
) -> NotificationActionResponse {
    let mut controller = match lock_controller() {
        Ok(controller) => controller,
        Err(message) => return NotificationActionResponse::unavailable(message),
    };
    let response = action(&mut controller);
    publish(&controller);
    response
}

fn lock_controller() -> Result<MutexGuard<'static, Controller>, String> {
    let controller = CONTROLLER.get_or_try_init(|| {
        let config = StoreConfig::from_env();
        open_collection(&config)
            .map(|collection| {
                Mutex::new(SyncController::with_loading_flag(
                    collection,
                    loading_flag().clone(),
                ))
            })
            .map_err(|err| format!("Failed to open notification store: {err}"))
    })?;

    Ok(controller.lock().unwrap_or_else(|poisoned| {
        warn!("event=controller_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    }))
}

fn loading_flag() -> &'static LoadingFlag {
    LOADING.get_or_init(LoadingFlag::default)
}

fn publish(controller: &Controller) -> Vec<NotificationItem> {
    let items = to_items(controller.notifications());
    match PUBLISHED.lock() {
        Ok(mut published) => *published = items.clone(),
        Err(poisoned) => *poisoned.into_inner() = items.clone(),
    }
    items
}

fn list_failure(message: String) -> NotificationListResponse {
    NotificationListResponse {
        ok: false,
        items: Vec::new(),
        loading: false,
        message,
    }
}

fn to_items(notifications: &[Notification]) -> Vec<NotificationItem> {
    notifications
        .iter()
        .filter_map(|notification| {
            let id = notification.id.as_ref()?;
            Some(NotificationItem {
                id: id.to_string(),
                title: notification.title.clone(),
                description: notification.description.clone(),
                date_epoch_ms: calendar_to_timestamp(notification.date),
                kind: notification.kind.as_str().to_string(),
            })
        })
        .collect()
}
