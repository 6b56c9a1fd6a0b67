//! Synchronization controller between the admin screen and the collection.
//!
//! # Responsibility
//! - Own the local notification list and loading flag.
//! - Run fetch-on-load, fetch-after-write and optimistic delete flows.
//! - Report every operation as an explicit success or `SyncError`.
//!
//! # Invariants
//! - Every entry in `notifications()` carries `id = Some(_)`.
//! - The list is only replaced wholesale by a successful refresh, or loses
//!   exactly one entry through a confirmed delete.
//! - `loading` is raised for the duration of every gateway listing and
//!   cleared on every refresh path.
//! - State transitions take `&mut self`, so they never interleave.

use crate::model::codec::{decode, encode};
use crate::model::document::DocumentId;
use crate::model::notification::{
    FormError, Notification, NotificationForm, NotificationId, NotificationKind,
};
use crate::store::{DocumentCollection, SortOrder, StoreError};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure surfaced to the presentation layer.
#[derive(Debug)]
pub enum SyncError {
    /// Form input failed submission preconditions.
    Form(FormError),
    /// Listing failed; the local list is unchanged.
    Load(StoreError),
    /// Insert failed; the local list is unchanged.
    Create(StoreError),
    /// Selected entry has no store identity; nothing was sent.
    MissingId { index: usize },
    /// Selected position does not exist in the local list.
    IndexOutOfRange { index: usize, len: usize },
    /// Gateway delete failed; the list was reconciled when possible.
    Delete(StoreError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form(err) => write!(f, "Cannot create notification: {err}"),
            Self::Load(err) => write!(f, "Failed to load notifications: {err}"),
            Self::Create(err) => write!(f, "Failed to create notification: {err}"),
            Self::MissingId { .. } => write!(f, "Cannot delete notification: missing id"),
            Self::IndexOutOfRange { index, len } => write!(
                f,
                "Cannot delete notification: position {index} is outside list of {len}"
            ),
            Self::Delete(err) => write!(f, "Failed to delete notification: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Form(err) => Some(err),
            Self::Load(err) | Self::Create(err) | Self::Delete(err) => Some(err),
            Self::MissingId { .. } | Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<FormError> for SyncError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

/// Request model for creating one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub description: String,
    pub date: NaiveDateTime,
    pub kind: NotificationKind,
}

impl From<NotificationForm> for CreateNotificationRequest {
    fn from(form: NotificationForm) -> Self {
        let Notification {
            title,
            description,
            date,
            kind,
            ..
        } = form.into_notification();
        Self {
            title,
            description,
            date,
            kind,
        }
    }
}

/// Successful create, plus the outcome of the follow-up reload.
#[derive(Debug)]
pub struct CreateOutcome {
    pub id: NotificationId,
    /// `Some(SyncError::Load)` when the record was stored but the list
    /// could not be re-fetched; the local list is then stale.
    pub reload: Option<SyncError>,
}

/// Loading indicator readable without access to the controller.
///
/// Clones share one flag, so a renderer can poll it while a refresh holds
/// the controller.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, loading: bool) {
        self.0.store(loading, Ordering::Release);
    }
}

/// Local mirror of the notification collection.
pub struct SyncController<C: DocumentCollection> {
    gateway: C,
    notifications: Vec<Notification>,
    loading: LoadingFlag,
    revision: u64,
}

impl<C: DocumentCollection> SyncController<C> {
    /// Creates a controller with an empty, not-yet-loaded list.
    pub fn new(gateway: C) -> Self {
        Self::with_loading_flag(gateway, LoadingFlag::default())
    }

    /// Creates a controller that reports loading through `loading`.
    pub fn with_loading_flag(gateway: C, loading: LoadingFlag) -> Self {
        Self {
            gateway,
            notifications: Vec::new(),
            loading,
            revision: 0,
        }
    }

    /// Current local list, newest first as of the last refresh.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Shared handle onto the loading indicator.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// Counter bumped on every local list change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn gateway(&self) -> &C {
        &self.gateway
    }

    /// Replaces the local list with the collection's current contents.
    ///
    /// # Errors
    /// - `SyncError::Load` when listing fails; the list is left untouched.
    pub fn refresh(&mut self) -> SyncResult<usize> {
        let started_at = Instant::now();
        self.loading.set(true);
        let listed = self.gateway.list(SortOrder::Descending);
        self.loading.set(false);

        match listed {
            Ok(documents) => {
                self.notifications = documents.iter().map(decode).collect();
                self.revision += 1;
                info!(
                    "event=notifications_refresh module=sync status=ok count={} duration_ms={}",
                    self.notifications.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(self.notifications.len())
            }
            Err(err) => {
                warn!(
                    "event=notifications_refresh module=sync status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(SyncError::Load(err))
            }
        }
    }

    /// Persists a new notification, then re-fetches the list.
    ///
    /// Does not validate input; see [`SyncController::submit`].
    ///
    /// # Contract
    /// - The new record's identity is only known after the refresh.
    /// - A refresh failure after a successful insert is returned in
    ///   `CreateOutcome::reload`; the record exists remotely and the list
    ///   stays as it was.
    ///
    /// # Errors
    /// - `SyncError::Create` when the insert fails; no retry happens.
    pub fn create(&mut self, request: CreateNotificationRequest) -> SyncResult<CreateOutcome> {
        let record = Notification::new(
            request.title,
            request.description,
            request.date,
            request.kind,
        );

        let id = match self.gateway.insert(&encode(&record)) {
            Ok(id) => NotificationId::from(id),
            Err(err) => {
                warn!("event=notification_create module=sync status=error error={err}");
                return Err(SyncError::Create(err));
            }
        };
        info!(
            "event=notification_create module=sync status=ok kind={} id={id}",
            record.kind.as_str()
        );

        let reload = match self.refresh() {
            Ok(_) => None,
            Err(err) => {
                warn!("event=notification_create module=sync status=stale_list id={id}");
                Some(err)
            }
        };
        Ok(CreateOutcome { id, reload })
    }

    /// Validates form input, then creates.
    ///
    /// # Errors
    /// - `SyncError::Form` before any gateway call.
    /// - Everything [`SyncController::create`] returns.
    pub fn submit(&mut self, form: NotificationForm) -> SyncResult<CreateOutcome> {
        if let Err(err) = form.validate() {
            info!("event=notification_create module=sync status=rejected reason={err}");
            return Err(err.into());
        }
        self.create(form.into())
    }

    /// Deletes the notification with `id`.
    ///
    /// # Contract
    /// - Success removes the matching local entry without a re-fetch.
    /// - Failure triggers a reconciling refresh before reporting.
    ///
    /// # Errors
    /// - `SyncError::Delete` carrying the gateway failure.
    pub fn delete(&mut self, id: &NotificationId) -> SyncResult<()> {
        match self.gateway.delete_by_id(&DocumentId::from(id)) {
            Ok(()) => {
                let before = self.notifications.len();
                self.notifications
                    .retain(|entry| entry.id.as_ref() != Some(id));
                if self.notifications.len() != before {
                    self.revision += 1;
                }
                info!("event=notification_delete module=sync status=ok id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=notification_delete module=sync status=error id={id} error={err}");
                if let Err(reconcile_err) = self.refresh() {
                    warn!(
                        "event=notification_delete module=sync status=reconcile_failed id={id} error={reconcile_err}"
                    );
                }
                Err(SyncError::Delete(err))
            }
        }
    }

    /// Deletes the entry at a list position.
    ///
    /// The position is resolved to an id before contacting the store; the
    /// deleted id is returned.
    ///
    /// # Errors
    /// - `SyncError::IndexOutOfRange` / `SyncError::MissingId` without any
    ///   gateway call.
    /// - Everything [`SyncController::delete`] returns.
    pub fn delete_at(&mut self, index: usize) -> SyncResult<NotificationId> {
        let entry = self
            .notifications
            .get(index)
            .ok_or(SyncError::IndexOutOfRange {
                index,
                len: self.notifications.len(),
            })?;
        let id = entry.id.clone().ok_or(SyncError::MissingId { index })?;
        self.delete(&id)?;
        Ok(id)
    }

    /// Test hook for seeding list states that decode never produces.
    #[cfg(test)]
    pub(crate) fn set_notifications(&mut self, notifications: Vec<Notification>) {
        self.notifications = notifications;
    }
}
