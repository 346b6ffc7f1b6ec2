//! Stockpile: inventory tracking with photo capture.
//!
//! Items live in a document collection keyed by name, with `{quantity, imageUrl?}` bodies.
//! Photos are captured from a video device, encoded, and stored in a blob store under
//! `inventory_images/{name}.jpg`; the resulting URL goes on the item.
//!
//! The pieces:
//!
//! - [`records`]: the [`RecordStore`] trait with in-memory and JSON file backends
//! - [`capture`]: singleton camera access, scoped sessions, snapshot staging
//! - [`codec`] and [`upload`]: JPEG/PNG encoding and blob upload
//! - [`sync`]: the [`SyncController`], which orders every remote call for an action
//! - [`view`] and [`state`]: the local listing, search filter, and dialogs
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use blobstash::MemoryBlobStore;
//! use stockpile::{
//!     BlobLayout, ImageCodec, ImageUploader, ListView, MemoryRecordStore, SubmitRequest,
//!     SyncController, SyncPolicy,
//! };
//!
//! # async fn demo() -> Result<(), stockpile::SyncError> {
//! let uploader = ImageUploader::new(
//!     Arc::new(MemoryBlobStore::new()),
//!     ImageCodec::default(),
//!     BlobLayout::default(),
//! );
//! let records = Arc::new(MemoryRecordStore::new());
//! let sync = SyncController::new(records, uploader, SyncPolicy::default());
//!
//! let mut view = ListView::new();
//! sync.submit(&mut view, SubmitRequest::create("Widget", 5)).await?;
//! assert_eq!(view.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod codec;
pub mod error;
pub mod item;
pub mod records;
pub mod state;
pub mod sync;
pub mod telemetry;
pub mod upload;
pub mod view;

pub use capture::{
    CaptureAdapter, CaptureError, CaptureSession, CaptureState, CapturedFrame, PatternDevice,
    StillImageDevice, VideoDevice,
};
pub use codec::{CodecError, EncodedImage, ImageCodec};
pub use error::{StoreError, SyncError, ValidationError};
pub use item::{InventoryItem, ItemFields};
pub use records::{JsonFileRecordStore, MemoryRecordStore, RecordStore, WriteMode};
pub use state::{DialogMode, EditDialog, InventoryState};
pub use sync::{
    AdjustOutcome, ImageOutcome, RemoveOutcome, SubmitOutcome, SubmitRequest, SyncController,
    SyncPolicy,
};
pub use upload::{BlobLayout, ImageUploader, UploadOutcome};
pub use view::ListView;
