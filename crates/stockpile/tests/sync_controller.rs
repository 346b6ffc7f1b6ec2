//! End-to-end behaviour of the sync controller against in-memory and file backends,
//! including injected store and blob failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blobstash::{BlobError, BlobPath, BlobReference, BlobStore, FileBlobStore, MemoryBlobStore};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use stockconf::{RenameImagePolicy, RenameOrder};
use stockpile::{
    BlobLayout, CaptureAdapter, CaptureError, CapturedFrame, ImageCodec, ImageOutcome,
    ImageUploader, InventoryItem, InventoryState, ItemFields, JsonFileRecordStore, ListView,
    MemoryRecordStore, PatternDevice, RecordStore, StoreError, SubmitRequest, SyncController,
    SyncError, SyncPolicy, ValidationError, WriteMode,
};
use tempfile::TempDir;

/// Memory store with switchable failures and a call counter.
#[derive(Default)]
struct FlakyRecords {
    inner: MemoryRecordStore,
    calls: AtomicUsize,
    fail_put: AtomicBool,
    fail_list: AtomicBool,
    fail_delete_of: Mutex<Option<String>>,
}

impl FlakyRecords {
    fn seeded(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        Self {
            inner: MemoryRecordStore::from_items(items).unwrap(),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn injected() -> StoreError {
        StoreError::Unavailable("injected failure".to_string())
    }
}

#[async_trait]
impl RecordStore for FlakyRecords {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.list().await
    }

    async fn get(&self, name: &str) -> Result<Option<InventoryItem>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(name).await
    }

    async fn put(&self, name: &str, fields: ItemFields, mode: WriteMode) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.put(name, fields, mode).await
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_of.lock().unwrap().as_deref() == Some(name) {
            return Err(Self::injected());
        }
        self.inner.delete(name).await
    }
}

/// Blob store that refuses every upload.
struct OfflineBlobs;

#[async_trait]
impl BlobStore for OfflineBlobs {
    async fn put(&self, _: &BlobPath, _: &[u8], _: &str) -> Result<BlobReference, BlobError> {
        Err(BlobError::Unavailable("bucket offline".to_string()))
    }

    async fn get(&self, _: &BlobPath) -> Result<Option<Vec<u8>>, BlobError> {
        Err(BlobError::Unavailable("bucket offline".to_string()))
    }

    async fn inspect(&self, _: &BlobPath) -> Result<Option<BlobReference>, BlobError> {
        Err(BlobError::Unavailable("bucket offline".to_string()))
    }

    async fn delete(&self, _: &BlobPath) -> Result<bool, BlobError> {
        Err(BlobError::Unavailable("bucket offline".to_string()))
    }

    fn url(&self, _: &BlobPath) -> Result<String, BlobError> {
        Err(BlobError::Unavailable("bucket offline".to_string()))
    }
}

fn controller(
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    policy: SyncPolicy,
) -> SyncController {
    let uploader = ImageUploader::new(blobs, ImageCodec::default(), BlobLayout::default());
    SyncController::new(records, uploader, policy)
}

fn memory_controller(records: Arc<dyn RecordStore>, policy: SyncPolicy) -> SyncController {
    controller(records, Arc::new(MemoryBlobStore::new()), policy)
}

fn write_first() -> SyncPolicy {
    SyncPolicy {
        rename_order: RenameOrder::WriteFirst,
        ..SyncPolicy::default()
    }
}

fn snapshot() -> CapturedFrame {
    CapturedFrame::new(RgbaImage::from_pixel(8, 8, Rgba([90, 160, 40, 255])))
}

#[tokio::test]
async fn test_create_then_list_has_exactly_one_item() {
    let records = Arc::new(MemoryRecordStore::new());
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    sync.submit(&mut view, SubmitRequest::create("Widget", 5)).await.unwrap();

    assert_eq!(records.list().await.unwrap(), vec![InventoryItem::new("Widget", 5)]);
    assert_eq!(view.items(), &[InventoryItem::new("Widget", 5)]);
}

#[tokio::test]
async fn test_resubmitting_a_name_updates_in_place() {
    let records = Arc::new(MemoryRecordStore::new());
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    sync.submit(&mut view, SubmitRequest::create("Widget", 5)).await.unwrap();
    sync.submit(&mut view, SubmitRequest::create("Widget", 8)).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(view.get("Widget"), Some(&InventoryItem::new("Widget", 8)));
}

#[tokio::test]
async fn test_rename_drops_old_photo_by_default() {
    let records = Arc::new(
        MemoryRecordStore::from_items([
            InventoryItem::new("Widget", 3)
                .with_image_url("memory://blobs/inventory_images/Widget.jpg"),
        ])
        .unwrap(),
    );
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let outcome = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Gadget", 4))
        .await
        .unwrap();

    assert_eq!(outcome.renamed_from.as_deref(), Some("Widget"));
    assert_eq!(outcome.image, ImageOutcome::Unchanged);
    assert_eq!(records.get("Widget").await.unwrap(), None);
    assert_eq!(records.get("Gadget").await.unwrap(), Some(InventoryItem::new("Gadget", 4)));
}

#[tokio::test]
async fn test_rename_can_carry_photo_forward() {
    let old_url = "memory://blobs/inventory_images/Widget.jpg";
    let records = Arc::new(
        MemoryRecordStore::from_items([
            InventoryItem::new("Widget", 3).with_image_url(old_url),
        ])
        .unwrap(),
    );
    let policy = SyncPolicy {
        rename_image: RenameImagePolicy::CarryForward,
        ..SyncPolicy::default()
    };
    let sync = memory_controller(records.clone(), policy);
    let mut view = ListView::new();

    let outcome = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Gadget", 4))
        .await
        .unwrap();

    assert_eq!(
        outcome.image,
        ImageOutcome::CarriedForward {
            url: old_url.to_string()
        }
    );
    assert_eq!(
        view.get("Gadget"),
        Some(&InventoryItem::new("Gadget", 4).with_image_url(old_url))
    );
}

#[tokio::test]
async fn test_rename_with_new_photo_uploads_under_new_name() {
    let records =
        Arc::new(MemoryRecordStore::from_items([InventoryItem::new("Widget", 3)]).unwrap());
    let blobs = Arc::new(MemoryBlobStore::new());
    let sync = controller(records.clone(), blobs.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let outcome = sync
        .submit(
            &mut view,
            SubmitRequest::edit("Widget", "Gadget", 3).with_image(snapshot()),
        )
        .await
        .unwrap();

    let ImageOutcome::Attached { url } = outcome.image else {
        panic!("expected an attached photo, got {:?}", outcome.image);
    };
    assert!(url.ends_with("inventory_images/Gadget.jpg"), "{url}");
    assert_eq!(blobs.paths(), vec![BlobPath::new("inventory_images/Gadget.jpg").unwrap()]);
    assert_eq!(
        records.get("Gadget").await.unwrap().and_then(|item| item.image_url),
        Some(url)
    );
}

#[tokio::test]
async fn test_remove_twice_is_not_an_error() {
    let records =
        Arc::new(MemoryRecordStore::from_items([InventoryItem::new("Widget", 1)]).unwrap());
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let first = sync.remove(&mut view, "Widget").await.unwrap();
    let second = sync.remove(&mut view, "Widget").await.unwrap();

    assert!(first.existed);
    assert!(!second.existed);
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_search_filters_refreshed_listing() {
    let records = Arc::new(
        MemoryRecordStore::from_items([
            InventoryItem::new("Widget", 1),
            InventoryItem::new("Gizmo", 2),
        ])
        .unwrap(),
    );
    let sync = memory_controller(records, SyncPolicy::default());
    let mut view = ListView::new();

    sync.refresh(&mut view).await.unwrap();
    view.set_search("wid");

    let names: Vec<_> = view.visible_items().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Widget"]);
}

#[tokio::test]
async fn test_invalid_submissions_make_no_remote_calls() {
    let records = Arc::new(FlakyRecords::default());
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let err = sync
        .submit(&mut view, SubmitRequest::create("Widget", 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Validation(ValidationError::QuantityTooLow { got: 0, .. })
    ));

    let err = sync
        .submit(&mut view, SubmitRequest::create("   ", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::EmptyName)));
    assert_eq!(records.calls(), 0);

    sync.submit(&mut view, SubmitRequest::create("Widget", 1)).await.unwrap();
    assert_eq!(records.inner.len(), 1);
}

#[tokio::test]
async fn test_failed_upload_still_saves_quantity() {
    let records = Arc::new(MemoryRecordStore::new());
    let sync = controller(records.clone(), Arc::new(OfflineBlobs), SyncPolicy::default());
    let mut view = ListView::new();

    let outcome = sync
        .submit(&mut view, SubmitRequest::create("Widget", 5).with_image(snapshot()))
        .await
        .unwrap();

    assert!(matches!(outcome.image, ImageOutcome::UploadFailed { .. }));
    assert_eq!(records.get("Widget").await.unwrap(), Some(InventoryItem::new("Widget", 5)));
}

#[tokio::test]
async fn test_failed_upload_on_edit_keeps_old_photo() {
    let old_url = "memory://blobs/inventory_images/Widget.jpg";
    let records = Arc::new(
        MemoryRecordStore::from_items([
            InventoryItem::new("Widget", 3).with_image_url(old_url),
        ])
        .unwrap(),
    );
    let sync = controller(records.clone(), Arc::new(OfflineBlobs), SyncPolicy::default());
    let mut view = ListView::new();

    let outcome = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Widget", 9).with_image(snapshot()))
        .await
        .unwrap();

    assert!(matches!(outcome.image, ImageOutcome::UploadFailed { .. }));
    assert_eq!(outcome.renamed_from, None);
    assert_eq!(
        records.get("Widget").await.unwrap(),
        Some(InventoryItem::new("Widget", 9).with_image_url(old_url))
    );
}

#[tokio::test]
async fn test_write_first_refuses_taken_name() {
    let records = Arc::new(
        MemoryRecordStore::from_items([
            InventoryItem::new("Widget", 1),
            InventoryItem::new("Gadget", 9),
        ])
        .unwrap(),
    );
    let blobs = Arc::new(MemoryBlobStore::new());
    let sync = controller(records.clone(), blobs.clone(), write_first());
    let mut view = ListView::new();

    let err = sync
        .submit(
            &mut view,
            SubmitRequest::edit("Widget", "Gadget", 2).with_image(snapshot()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::NameTaken(name) if name == "Gadget"));
    assert_eq!(records.get("Widget").await.unwrap(), Some(InventoryItem::new("Widget", 1)));
    assert_eq!(records.get("Gadget").await.unwrap(), Some(InventoryItem::new("Gadget", 9)));
    assert!(blobs.is_empty(), "refused rename must not overwrite the other item's photo");
}

#[tokio::test]
async fn test_write_first_refuses_name_held_by_malformed_document() {
    let dir = TempDir::new().unwrap();
    let records = Arc::new(JsonFileRecordStore::new(dir.path(), "inventory"));
    std::fs::write(
        records.path(),
        br#"{"Widget": {"quantity": 1}, "Gadget": {"quantity": -3, "note": "hand edited"}}"#,
    )
    .unwrap();
    let sync = memory_controller(records.clone(), write_first());
    let mut view = ListView::new();

    let err = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Gadget", 2))
        .await
        .unwrap_err();

    assert!(
        matches!(err, SyncError::Store(StoreError::Malformed { ref name, .. }) if name == "Gadget"),
        "got {err:?}"
    );
    assert_eq!(records.get("Widget").await.unwrap(), Some(InventoryItem::new("Widget", 1)));
    let raw = std::fs::read_to_string(records.path()).unwrap();
    assert!(raw.contains("hand edited"));
}

#[tokio::test]
async fn test_write_first_undoes_new_record_when_old_delete_fails() {
    let records = Arc::new(FlakyRecords::seeded([InventoryItem::new("Widget", 3)]));
    *records.fail_delete_of.lock().unwrap() = Some("Widget".to_string());
    let sync = memory_controller(records.clone(), write_first());
    let mut view = ListView::new();

    let err = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Gadget", 3))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(records.inner.get("Gadget").await.unwrap(), None);
    assert_eq!(
        records.inner.get("Widget").await.unwrap(),
        Some(InventoryItem::new("Widget", 3))
    );
}

#[tokio::test]
async fn test_delete_first_loses_item_when_write_fails() {
    let records = Arc::new(FlakyRecords::seeded([InventoryItem::new("Widget", 3)]));
    records.fail_put.store(true, Ordering::SeqCst);
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let err = sync
        .submit(&mut view, SubmitRequest::edit("Widget", "Gadget", 3))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Store(_)));
    assert!(records.inner.is_empty());
}

#[tokio::test]
async fn test_refresh_failure_after_write_is_reported_not_raised() {
    let records = Arc::new(FlakyRecords::default());
    records.fail_list.store(true, Ordering::SeqCst);
    let sync = memory_controller(records.clone(), SyncPolicy::default());
    let mut view = ListView::new();

    let outcome = sync
        .submit(&mut view, SubmitRequest::create("Widget", 2))
        .await
        .unwrap();

    assert!(!outcome.refreshed);
    assert!(view.is_empty());
    assert_eq!(
        records.inner.get("Widget").await.unwrap(),
        Some(InventoryItem::new("Widget", 2))
    );
}

#[tokio::test]
async fn test_dialog_stays_open_on_store_failure() {
    let records = Arc::new(FlakyRecords::default());
    records.fail_put.store(true, Ordering::SeqCst);
    let sync = memory_controller(records.clone(), SyncPolicy::default());

    let mut state = InventoryState::new();
    let dialog = state.open_add();
    dialog.name = "Widget".to_string();
    dialog.quantity = 4;
    dialog.staged_image = Some(snapshot());

    let err = sync.submit_dialog(&mut state).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));

    let dialog = state.dialog.as_ref().expect("dialog should still be open");
    assert_eq!(dialog.name, "Widget");
    assert_eq!(dialog.quantity, 4);
    assert!(dialog.staged_image.is_some());

    records.fail_put.store(false, Ordering::SeqCst);
    let outcome = sync.submit_dialog(&mut state).await.unwrap();
    assert_eq!(outcome.map(|o| o.name), Some("Widget".to_string()));
    assert!(state.dialog.is_none());
    assert_eq!(state.view.len(), 1);
}

#[tokio::test]
async fn test_confirm_delete_clears_prompt_only_on_success() {
    let records = Arc::new(FlakyRecords::seeded([InventoryItem::new("Widget", 1)]));
    *records.fail_delete_of.lock().unwrap() = Some("Widget".to_string());
    let sync = memory_controller(records.clone(), SyncPolicy::default());

    let mut state = InventoryState::new();
    assert_eq!(sync.confirm_delete(&mut state).await.unwrap(), None);

    state.request_delete("Widget");
    assert!(sync.confirm_delete(&mut state).await.is_err());
    assert_eq!(state.pending_delete.as_deref(), Some("Widget"));

    *records.fail_delete_of.lock().unwrap() = None;
    let outcome = sync.confirm_delete(&mut state).await.unwrap().unwrap();
    assert!(outcome.existed);
    assert!(state.pending_delete.is_none());
}

#[tokio::test]
async fn test_busy_camera_surfaces_as_capture_unavailable() {
    let adapter = CaptureAdapter::new(Arc::new(PatternDevice::default()));
    let _held = adapter.start().await.unwrap();

    let mut state = InventoryState::new();
    let result: Result<(), SyncError> = async {
        state.open_add().open_camera(&adapter).await?;
        Ok(())
    }
    .await;

    assert!(matches!(result, Err(SyncError::CaptureUnavailable(_))));
    assert!(matches!(adapter.start().await, Err(CaptureError::Busy)));
}

#[tokio::test]
async fn test_file_backends_round_trip_with_captured_photo() {
    let temp = TempDir::new().unwrap();
    let state_dir = temp.path().join("state");
    let blob_dir = temp.path().join("blobs");

    let sync = controller(
        Arc::new(JsonFileRecordStore::new(&state_dir, "inventory")),
        Arc::new(FileBlobStore::at_path(&blob_dir).unwrap()),
        SyncPolicy::default(),
    );

    let adapter = CaptureAdapter::new(Arc::new(PatternDevice::new(64, 48)));
    let mut state = InventoryState::new();
    let dialog = state.open_add();
    dialog.name = "Widget".to_string();
    dialog.quantity = 2;
    dialog.open_camera(&adapter).await.unwrap();
    dialog.take_snapshot(32, 24).unwrap();

    let outcome = sync.submit_dialog(&mut state).await.unwrap().unwrap();
    assert!(matches!(outcome.image, ImageOutcome::Attached { .. }));
    assert!(blob_dir.join("objects/inventory_images/Widget.jpg").is_file());

    // A fresh process sees the same record.
    let reopened = JsonFileRecordStore::new(&state_dir, "inventory");
    let items = reopened.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert!(items[0]
        .image_url
        .as_deref()
        .is_some_and(|url| url.starts_with("file://") && url.ends_with("Widget.jpg")));
}
