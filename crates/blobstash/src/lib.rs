//! Path-addressed blob storage for Stockpile.
//!
//! Item photos live at deterministic paths (`inventory_images/{name}.jpg`), so unlike a
//! content-addressed store a path can be overwritten by a later upload. Each object
//! carries a JSON sidecar with its content type, size and BLAKE3 digest.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use blobstash::{BlobPath, BlobStore, FileBlobStore};
//!
//! # async fn demo() -> Result<(), blobstash::BlobError> {
//! let store = FileBlobStore::at_path("/var/lib/stockpile/blobs")?;
//! let path = BlobPath::new("inventory_images/Widget.jpg")?;
//!
//! let reference = store.put(&path, b"\xff\xd8...", "image/jpeg").await?;
//! println!("uploaded to {}", reference.url);
//!
//! if let Some(bytes) = store.get(&path).await? {
//!     println!("got {} bytes back", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! ```text
//! {base_path}/
//! ├── objects/
//! │   └── inventory_images/Widget.jpg
//! ├── metadata/
//! │   └── inventory_images/Widget.jpg.json   # {content_type, size, hash}
//! └── staging/
//!     └── 3f2a...                            # in-flight uploads
//! ```
//!
//! Uploads are written to `staging/` first and renamed into `objects/`, so readers
//! never observe a half-written photo.

pub mod config;
pub mod error;
pub mod hash;
pub mod memory;
pub mod metadata;
pub mod path;
pub mod staging;
pub mod store;

pub use config::StashConfig;
pub use error::BlobError;
pub use hash::{ContentHash, HashError};
pub use memory::MemoryBlobStore;
pub use metadata::{BlobMetadata, BlobReference};
pub use path::BlobPath;
pub use store::{BlobStore, FileBlobStore};
