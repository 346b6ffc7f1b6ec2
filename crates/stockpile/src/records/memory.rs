//! In-memory record store (BTreeMap-backed).

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::item::{InventoryItem, ItemFields};
use crate::records::document::{self, Document};
use crate::records::{RecordStore, WriteMode};

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with items, as if each had been written with an overwrite.
    pub fn from_items(items: impl IntoIterator<Item = InventoryItem>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut documents = store.documents.write().unwrap();
            for item in items {
                let fields = ItemFields::quantity(item.quantity).with_image_url(item.image_url);
                if let Some(created) = document::apply(None, fields, WriteMode::Overwrite)? {
                    documents.insert(item.name, created);
                }
            }
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw document under `name`, for inspecting exactly what was written.
    pub fn document(&self, name: &str) -> Option<Document> {
        self.documents.read().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let documents = self.documents.read().unwrap();
        Ok(document::decode_all(documents.iter()))
    }

    async fn get(&self, name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let documents = self.documents.read().unwrap();
        document::lookup(name, documents.get(name))
    }

    async fn put(&self, name: &str, fields: ItemFields, mode: WriteMode) -> Result<(), StoreError> {
        let mut documents = self.documents.write().unwrap();
        if let Some(created) = document::apply(documents.get_mut(name), fields, mode)? {
            documents.insert(name.to_string(), created);
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.documents.write().unwrap().remove(name).is_some())
    }
}
