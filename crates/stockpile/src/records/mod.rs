//! Inventory record store: a document collection keyed by item name.
//!
//! Each document holds `{quantity, imageUrl?}`. Backends are reached through the
//! [`RecordStore`] trait so the sync controller never knows whether it is talking
//! to a hosted database, a JSON file on a shared mount, or a map in a test.

pub mod document;
pub mod json_file;
pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::item::{InventoryItem, ItemFields};

pub use json_file::JsonFileRecordStore;
pub use memory::MemoryRecordStore;

/// How `put` treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document with the given fields.
    Overwrite,
    /// Set only the given fields, keeping the rest.
    Merge,
}

/// Trait for record store backends.
///
/// Every call is a round-trip to the backend; implementations must not cache.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every item currently in the collection, in no particular order.
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// The item stored under `name`, if any.
    async fn get(&self, name: &str) -> Result<Option<InventoryItem>, StoreError>;

    /// Create the document if absent, otherwise overwrite or merge into it.
    async fn put(&self, name: &str, fields: ItemFields, mode: WriteMode) -> Result<(), StoreError>;

    /// Remove the document. Returns whether it existed; absence is not an error.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;
}
