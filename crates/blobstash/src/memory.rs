//! In-memory blob store for tests and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::BlobError;
use crate::metadata::{BlobMetadata, BlobReference};
use crate::path::BlobPath;
use crate::store::BlobStore;

/// HashMap-backed blob store. URLs are `{base_url}{path}`.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: RwLock<HashMap<BlobPath, (Vec<u8>, BlobMetadata)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_base_url("memory://blobs/")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths currently stored, sorted.
    pub fn paths(&self) -> Vec<BlobPath> {
        let mut paths: Vec<_> = self.objects.read().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &BlobPath,
        data: &[u8],
        content_type: &str,
    ) -> Result<BlobReference, BlobError> {
        let metadata = BlobMetadata::describe(data, content_type);
        self.objects
            .write()
            .unwrap()
            .insert(path.clone(), (data.to_vec(), metadata.clone()));
        Ok(BlobReference::new(path.clone(), metadata, self.url(path)?))
    }

    async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, BlobError> {
        let objects = self.objects.read().unwrap();
        Ok(objects.get(path).map(|(data, _)| data.clone()))
    }

    async fn inspect(&self, path: &BlobPath) -> Result<Option<BlobReference>, BlobError> {
        let metadata = {
            let objects = self.objects.read().unwrap();
            objects.get(path).map(|(_, metadata)| metadata.clone())
        };
        match metadata {
            Some(metadata) => Ok(Some(BlobReference::new(path.clone(), metadata, self.url(path)?))),
            None => Ok(None),
        }
    }

    async fn delete(&self, path: &BlobPath) -> Result<bool, BlobError> {
        Ok(self.objects.write().unwrap().remove(path).is_some())
    }

    fn url(&self, path: &BlobPath) -> Result<String, BlobError> {
        Ok(format!("{}{}", self.base_url, path))
    }
}
