use chrono::{NaiveDate, NaiveDateTime};
use std::cell::{Cell, RefCell};
use weathernote_core::db::open_db_in_memory;
use weathernote_core::{
    encode, CreateNotificationRequest, DocumentCollection, DocumentFields, DocumentId, FieldValue,
    FormError, LoadingFlag, Notification, NotificationForm, NotificationId, NotificationKind,
    SortOrder, SqliteCollection, StoreError, StoreResult, SyncController, SyncError,
};

/// In-memory collection with switchable failures and a call log.
#[derive(Default)]
struct ScriptedCollection {
    documents: RefCell<Vec<weathernote_core::Document>>,
    next_id: Cell<u32>,
    fail_list: Cell<bool>,
    fail_insert: Cell<bool>,
    fail_delete: Cell<bool>,
    calls: RefCell<Vec<&'static str>>,
}

impl ScriptedCollection {
    /// Adds a document as if another client wrote it; newest first.
    fn seed(&self, title: &str, kind: &str) -> DocumentId {
        let id = self.allocate_id();
        let mut fields = DocumentFields::new();
        fields.insert("title".to_string(), FieldValue::String(title.to_string()));
        fields.insert(
            "description".to_string(),
            FieldValue::String(format!("{title} details")),
        );
        fields.insert("type".to_string(), FieldValue::String(kind.to_string()));
        fields.insert("date".to_string(), FieldValue::Timestamp(1_717_200_000_000));
        self.documents
            .borrow_mut()
            .insert(0, weathernote_core::Document::new(id.clone(), fields));
        id
    }

    fn remove_remote(&self, id: &DocumentId) {
        self.documents.borrow_mut().retain(|doc| &doc.id != id);
    }

    fn allocate_id(&self) -> DocumentId {
        let next = self.next_id.get() + 1;
        self.next_id.set(next);
        DocumentId::new(format!("doc-{next}"))
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn transport_error() -> StoreError {
        StoreError::Encoding("permission denied".to_string())
    }
}

impl DocumentCollection for ScriptedCollection {
    fn list(&self, order: SortOrder) -> StoreResult<Vec<weathernote_core::Document>> {
        self.calls.borrow_mut().push("list");
        assert_eq!(order, SortOrder::Descending);
        if self.fail_list.get() {
            return Err(Self::transport_error());
        }
        Ok(self.documents.borrow().clone())
    }

    fn insert(&self, fields: &DocumentFields) -> StoreResult<DocumentId> {
        self.calls.borrow_mut().push("insert");
        if self.fail_insert.get() {
            return Err(Self::transport_error());
        }
        assert_eq!(fields.get("createdAt"), Some(&FieldValue::ServerTimestamp));
        let id = self.allocate_id();
        let mut stored = fields.clone();
        stored.insert("createdAt".to_string(), FieldValue::Timestamp(1));
        self.documents
            .borrow_mut()
            .insert(0, weathernote_core::Document::new(id.clone(), stored));
        Ok(id)
    }

    fn delete_by_id(&self, id: &DocumentId) -> StoreResult<()> {
        self.calls.borrow_mut().push("delete");
        if self.fail_delete.get() {
            return Err(Self::transport_error());
        }
        let mut documents = self.documents.borrow_mut();
        let before = documents.len();
        documents.retain(|doc| &doc.id != id);
        if documents.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

fn june_first() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn request(title: &str, description: &str, kind: NotificationKind) -> CreateNotificationRequest {
    CreateNotificationRequest {
        title: title.to_string(),
        description: description.to_string(),
        date: june_first(),
        kind,
    }
}

fn titles(controller: &SyncController<ScriptedCollection>) -> Vec<String> {
    controller
        .notifications()
        .iter()
        .map(|n| n.title.clone())
        .collect()
}

#[test]
fn refresh_replaces_list_with_listed_documents() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let stale = controller.gateway().seed("Stale", "info");
    controller.gateway().seed("Keep", "warning");
    controller.refresh().unwrap();
    assert_eq!(titles(&controller), ["Keep", "Stale"]);

    controller.gateway().remove_remote(&stale);
    controller.gateway().seed("Fresh", "info");
    let count = controller.refresh().unwrap();

    assert_eq!(count, 2);
    assert_eq!(titles(&controller), ["Fresh", "Keep"]);
    assert!(controller.notifications().iter().all(Notification::is_persisted));
    assert!(!controller.is_loading());
}

#[test]
fn refresh_failure_keeps_list_and_clears_loading() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    controller.gateway().seed("Existing", "info");
    controller.refresh().unwrap();
    let revision = controller.revision();

    controller.gateway().seed("Unseen", "info");
    controller.gateway().fail_list.set(true);
    let err = controller.refresh().unwrap_err();

    assert!(matches!(err, SyncError::Load(_)));
    assert!(err.to_string().starts_with("Failed to load notifications:"));
    assert_eq!(titles(&controller), ["Existing"]);
    assert!(!controller.is_loading());
    assert_eq!(controller.revision(), revision);
}

#[test]
fn create_inserts_then_refetches() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    controller.gateway().seed("Older", "info");

    let outcome = controller
        .create(request("Flood Watch", "River levels rising", NotificationKind::Warning))
        .unwrap();
    let id = outcome.id;
    assert!(outcome.reload.is_none());

    assert_eq!(controller.gateway().calls(), ["insert", "list"]);
    assert_eq!(titles(&controller), ["Flood Watch", "Older"]);
    let created = &controller.notifications()[0];
    assert_eq!(created.id.as_ref(), Some(&id));
    assert_eq!(created.kind, NotificationKind::Warning);
    assert_eq!(created.date, june_first());
}

#[test]
fn create_failure_leaves_list_unchanged_without_retry() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    controller.gateway().seed("Existing", "info");
    controller.refresh().unwrap();
    controller.gateway().clear_calls();
    controller.gateway().fail_insert.set(true);

    let err = controller
        .create(request("Frost", "Below zero overnight", NotificationKind::Info))
        .unwrap_err();

    assert!(matches!(err, SyncError::Create(_)));
    assert_eq!(
        err.to_string(),
        "Failed to create notification: invalid document encoding: permission denied"
    );
    assert_eq!(controller.gateway().calls(), ["insert"]);
    assert_eq!(titles(&controller), ["Existing"]);
}

#[test]
fn create_reports_failed_follow_up_refresh() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    controller.gateway().fail_list.set(true);

    let outcome = controller
        .create(request("Wind", "Gale force", NotificationKind::Warning))
        .unwrap();
    let id = outcome.id;

    let reload = outcome.reload.expect("reload failure is reported");
    assert!(matches!(reload, SyncError::Load(_)));
    assert!(reload
        .to_string()
        .starts_with("Failed to load notifications:"));
    assert_eq!(controller.gateway().calls(), ["insert", "list"]);
    assert!(controller.notifications().is_empty());
    assert!(!controller.is_loading());

    controller.gateway().fail_list.set(false);
    controller.refresh().unwrap();
    assert_eq!(controller.notifications()[0].id.as_ref(), Some(&id));
}

#[test]
fn submit_rejects_blank_form_before_any_call() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let form = NotificationForm {
        title: "Storm Warning".to_string(),
        description: "   ".to_string(),
        date: june_first(),
        kind: NotificationKind::Warning,
    };

    let err = controller.submit(form).unwrap_err();
    assert!(matches!(err, SyncError::Form(FormError::EmptyDescription)));
    assert!(controller.gateway().calls().is_empty());
}

#[test]
fn submit_trims_and_creates_valid_form() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let form = NotificationForm {
        title: "  Heat Advisory ".to_string(),
        description: "Stay indoors\n".to_string(),
        date: june_first(),
        kind: NotificationKind::Info,
    };

    controller.submit(form).unwrap();
    assert_eq!(titles(&controller), ["Heat Advisory"]);
    assert_eq!(controller.notifications()[0].description, "Stay indoors");
}

#[test]
fn delete_success_removes_only_target_without_refetch() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    for title in ["D", "C", "B", "A"] {
        controller.gateway().seed(title, "info");
    }
    controller.refresh().unwrap();
    controller.gateway().clear_calls();
    let target = controller.notifications()[1].id.clone().unwrap();

    controller.delete(&target).unwrap();

    assert_eq!(controller.gateway().calls(), ["delete"]);
    assert_eq!(titles(&controller), ["A", "C", "D"]);
}

#[test]
fn delete_at_resolves_position_to_id() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let oldest = controller.gateway().seed("C", "info");
    for title in ["B", "A"] {
        controller.gateway().seed(title, "info");
    }
    controller.refresh().unwrap();
    let revision = controller.revision();

    let deleted = controller.delete_at(2).unwrap();

    assert_eq!(deleted.as_str(), oldest.as_str());

    assert_eq!(titles(&controller), ["A", "B"]);
    assert_eq!(controller.revision(), revision + 1);
}

#[test]
fn delete_failure_reconciles_with_remote_state() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let removed_elsewhere = controller.gateway().seed("Removed elsewhere", "info");
    controller.gateway().seed("Target", "warning");
    controller.refresh().unwrap();

    controller.gateway().remove_remote(&removed_elsewhere);
    controller.gateway().seed("Added elsewhere", "info");
    controller.gateway().fail_delete.set(true);
    controller.gateway().clear_calls();
    let target = controller.notifications()[0].id.clone().unwrap();

    let err = controller.delete(&target).unwrap_err();

    assert!(matches!(err, SyncError::Delete(_)));
    assert!(err.to_string().starts_with("Failed to delete notification:"));
    assert_eq!(controller.gateway().calls(), ["delete", "list"]);
    assert_eq!(titles(&controller), ["Added elsewhere", "Target"]);
}

#[test]
fn delete_of_unknown_id_reports_failure_and_reconciles() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    let id = controller.gateway().seed("Ghost", "info");
    controller.refresh().unwrap();
    controller.gateway().remove_remote(&id);

    let err = controller.delete(&NotificationId::from(id)).unwrap_err();

    assert!(matches!(err, SyncError::Delete(StoreError::NotFound(_))));
    assert!(controller.notifications().is_empty());
}

#[test]
fn delete_failure_with_failed_reconcile_reports_delete_error() {
    let mut controller = SyncController::new(ScriptedCollection::default());
    controller.gateway().seed("Sticky", "info");
    controller.refresh().unwrap();
    controller.gateway().fail_delete.set(true);
    controller.gateway().fail_list.set(true);

    let err = controller.delete_at(0).unwrap_err();

    assert!(matches!(err, SyncError::Delete(_)));
    assert_eq!(titles(&controller), ["Sticky"]);
    assert!(!controller.is_loading());
}

#[test]
fn storm_warning_lifecycle_against_sqlite_collection() {
    let collection = SqliteCollection::new(open_db_in_memory().unwrap(), "weatherNotifications");
    let mut controller = SyncController::new(collection);
    controller.refresh().unwrap();
    assert!(controller.notifications().is_empty());

    controller
        .create(request(
            "Storm Warning",
            "Heavy rain expected",
            NotificationKind::Warning,
        ))
        .unwrap();
    controller.refresh().unwrap();

    assert_eq!(controller.notifications().len(), 1);
    let entry = &controller.notifications()[0];
    assert_eq!(entry.title, "Storm Warning");
    assert_eq!(entry.kind, NotificationKind::Warning);
    assert!(entry.id.is_some());
    let stored = controller.gateway().list(SortOrder::Descending).unwrap();
    let mut expected = encode(entry);
    expected.remove("createdAt");
    let mut persisted = stored[0].fields.clone();
    assert!(matches!(
        persisted.remove("createdAt"),
        Some(FieldValue::Timestamp(_))
    ));
    assert_eq!(persisted, expected);

    controller.delete_at(0).unwrap();
    assert!(controller.notifications().is_empty());
    controller.refresh().unwrap();
    assert!(controller.notifications().is_empty());
}

/// Collection that records the controller's loading flag while listing.
struct ObservingCollection {
    loading: LoadingFlag,
    seen_while_listing: Cell<Option<bool>>,
    fail: bool,
}

impl DocumentCollection for ObservingCollection {
    fn list(&self, _order: SortOrder) -> StoreResult<Vec<weathernote_core::Document>> {
        self.seen_while_listing.set(Some(self.loading.is_loading()));
        if self.fail {
            return Err(StoreError::Encoding("unreachable".to_string()));
        }
        Ok(Vec::new())
    }

    fn insert(&self, _fields: &DocumentFields) -> StoreResult<DocumentId> {
        Ok(DocumentId::new("unused"))
    }

    fn delete_by_id(&self, _id: &DocumentId) -> StoreResult<()> {
        Ok(())
    }
}

#[test]
fn loading_is_visible_through_shared_flag_during_listing() {
    for fail in [false, true] {
        let flag = LoadingFlag::default();
        let gateway = ObservingCollection {
            loading: flag.clone(),
            seen_while_listing: Cell::new(None),
            fail,
        };
        let mut controller = SyncController::with_loading_flag(gateway, flag.clone());
        assert!(!flag.is_loading());

        let result = controller.refresh();

        assert_eq!(result.is_err(), fail);
        assert_eq!(controller.gateway().seen_while_listing.get(), Some(true));
        assert!(!flag.is_loading());
        assert!(!controller.loading_flag().is_loading());
    }
}
