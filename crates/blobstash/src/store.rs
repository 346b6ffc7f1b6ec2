//! FileBlobStore: filesystem-backed blob storage.
//!
//! Implements the BlobStore trait over a local directory. A shared mount (NFS, a bucket
//! FUSE mount) works the same way; set `public_base_url` to whatever serves `objects/`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::config::StashConfig;
use crate::error::BlobError;
use crate::metadata::{BlobMetadata, BlobReference};
use crate::path::BlobPath;
use crate::staging::StagedWrite;

/// Trait for blob storage backends.
///
/// Every call may be a network round-trip; implementations must not cache.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path`, replacing any previous object there.
    async fn put(
        &self,
        path: &BlobPath,
        data: &[u8],
        content_type: &str,
    ) -> Result<BlobReference, BlobError>;

    /// Fetch the bytes at `path`. `Ok(None)` if nothing is stored there.
    async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, BlobError>;

    /// Describe the object at `path` without reading it.
    async fn inspect(&self, path: &BlobPath) -> Result<Option<BlobReference>, BlobError>;

    /// Remove the object at `path`. Returns whether something was removed.
    async fn delete(&self, path: &BlobPath) -> Result<bool, BlobError>;

    /// Retrievable URL for `path`. Does not check that the object exists.
    fn url(&self, path: &BlobPath) -> Result<String, BlobError>;
}

/// Filesystem blob store.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    config: StashConfig,
}

impl FileBlobStore {
    /// Create the store, making the objects and metadata directories unless read-only.
    pub fn new(config: StashConfig) -> Result<Self, BlobError> {
        if !config.read_only {
            for dir in [config.objects_dir(), config.metadata_dir()] {
                std::fs::create_dir_all(&dir).map_err(|e| BlobError::io(&dir, e))?;
            }
        }
        Ok(Self { config })
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self, BlobError> {
        Self::new(StashConfig::with_base_path(path))
    }

    pub fn read_only_at(path: impl Into<PathBuf>) -> Result<Self, BlobError> {
        Self::new(StashConfig::read_only(path))
    }

    pub fn config(&self) -> &StashConfig {
        &self.config
    }

    fn object_path(&self, path: &BlobPath) -> PathBuf {
        self.config.objects_dir().join(path.to_relative_path())
    }

    fn metadata_path(&self, path: &BlobPath) -> PathBuf {
        let mut sidecar = self.config.metadata_dir().join(path.to_relative_path());
        sidecar.set_file_name(format!("{}.json", path.file_name()));
        sidecar
    }

    async fn read_metadata(&self, path: &BlobPath) -> Result<Option<BlobMetadata>, BlobError> {
        let meta_path = self.metadata_path(path);
        let json = match fs::read_to_string(&meta_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BlobError::io(meta_path, e)),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| BlobError::Metadata {
                path: path.to_string(),
                source,
            })
    }

    async fn write_metadata(
        &self,
        path: &BlobPath,
        metadata: &BlobMetadata,
    ) -> Result<(), BlobError> {
        let meta_path = self.metadata_path(path);
        if let Some(parent) = meta_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::io(parent, e))?;
        }
        let json = serde_json::to_vec(metadata).map_err(|source| BlobError::Metadata {
            path: path.to_string(),
            source,
        })?;
        fs::write(&meta_path, json)
            .await
            .map_err(|e| BlobError::io(meta_path, e))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn put(
        &self,
        path: &BlobPath,
        data: &[u8],
        content_type: &str,
    ) -> Result<BlobReference, BlobError> {
        if self.config.read_only {
            return Err(BlobError::ReadOnly);
        }

        let staged = StagedWrite::create(&self.config.staging_dir(), data).await?;
        debug!(blob.path = %path, staging.id = staged.id(), size = data.len(), "publishing blob");
        staged.publish(&self.object_path(path)).await?;

        let metadata = BlobMetadata::describe(data, content_type);
        if self.config.store_metadata {
            self.write_metadata(path, &metadata).await?;
        }

        let url = self.url(path)?;
        Ok(BlobReference::new(path.clone(), metadata, url))
    }

    async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, BlobError> {
        let obj_path = self.object_path(path);
        match fs::read(&obj_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::io(obj_path, e)),
        }
    }

    async fn inspect(&self, path: &BlobPath) -> Result<Option<BlobReference>, BlobError> {
        let obj_path = self.object_path(path);
        if !fs::try_exists(&obj_path)
            .await
            .map_err(|e| BlobError::io(&obj_path, e))?
        {
            return Ok(None);
        }

        let metadata = match self.read_metadata(path).await? {
            Some(metadata) => metadata,
            // No sidecar: hash the object and fall back to a generic type.
            None => {
                let data = fs::read(&obj_path)
                    .await
                    .map_err(|e| BlobError::io(&obj_path, e))?;
                BlobMetadata::describe(&data, "application/octet-stream")
            }
        };

        Ok(Some(BlobReference::new(path.clone(), metadata, self.url(path)?)))
    }

    async fn delete(&self, path: &BlobPath) -> Result<bool, BlobError> {
        if self.config.read_only {
            return Err(BlobError::ReadOnly);
        }

        let obj_path = self.object_path(path);
        let removed = match fs::remove_file(&obj_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(BlobError::io(obj_path, e)),
        };

        let meta_path = self.metadata_path(path);
        match fs::remove_file(&meta_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BlobError::io(meta_path, e)),
        }

        Ok(removed)
    }

    fn url(&self, path: &BlobPath) -> Result<String, BlobError> {
        let url_error = |reason: String| BlobError::Url {
            path: path.to_string(),
            reason,
        };

        match &self.config.public_base_url {
            Some(base) => {
                let mut url = Url::parse(base).map_err(|e| url_error(e.to_string()))?;
                url.path_segments_mut()
                    .map_err(|_| url_error(format!("{base} cannot be a base URL")))?
                    .pop_if_empty()
                    .extend(path.segments());
                Ok(url.into())
            }
            None => Url::from_file_path(self.object_path(path))
                .map(String::from)
                .map_err(|_| url_error("store path is not absolute".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn photo_path() -> BlobPath {
        BlobPath::new("inventory_images/Widget.jpg").unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;

        let reference = store.put(&photo_path(), b"\xff\xd8jpeg", "image/jpeg").await?;
        assert_eq!(reference.size_bytes, 6);
        assert_eq!(reference.content_type, "image/jpeg");

        let data = store.get(&photo_path()).await?.expect("should exist");
        assert_eq!(data, b"\xff\xd8jpeg");
        Ok(())
    }

    #[tokio::test]
    async fn test_put_replaces_previous_object() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;

        let first = store.put(&photo_path(), b"first", "image/jpeg").await?;
        let second = store.put(&photo_path(), b"second take", "image/jpeg").await?;
        assert_ne!(first.hash, second.hash);

        let inspected = store.inspect(&photo_path()).await?.expect("should exist");
        assert_eq!(inspected.hash, second.hash);
        assert_eq!(inspected.size_bytes, 11);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_object() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;

        assert!(store.get(&photo_path()).await?.is_none());
        assert!(store.inspect(&photo_path()).await?.is_none());
        assert!(!store.delete(&photo_path()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_object_and_sidecar() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;

        store.put(&photo_path(), b"bytes", "image/jpeg").await?;
        assert!(store.delete(&photo_path()).await?);
        assert!(store.get(&photo_path()).await?.is_none());
        assert!(!temp
            .path()
            .join("metadata/inventory_images/Widget.jpg.json")
            .exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_inspect_without_sidecar() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let mut config = StashConfig::with_base_path(temp.path());
        config.store_metadata = false;
        let store = FileBlobStore::new(config)?;

        store.put(&photo_path(), b"no sidecar", "image/jpeg").await?;
        let reference = store.inspect(&photo_path()).await?.expect("should exist");
        assert_eq!(reference.content_type, "application/octet-stream");
        assert_eq!(reference.size_bytes, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_damaged_sidecar_hash_is_rejected() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;
        store.put(&photo_path(), b"bytes", "image/jpeg").await?;

        std::fs::write(
            temp.path().join("metadata/inventory_images/Widget.jpg.json"),
            r#"{"content_type":"image/jpeg","size":5,"hash":"zz"}"#,
        )
        .unwrap();

        let err = store.inspect(&photo_path()).await.unwrap_err();
        assert!(matches!(err, BlobError::Metadata { .. }), "got {err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::read_only_at(temp.path())?;

        let result = store.put(&photo_path(), b"nope", "image/jpeg").await;
        assert!(matches!(result, Err(BlobError::ReadOnly)));
        Ok(())
    }

    #[tokio::test]
    async fn test_file_url_by_default() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let store = FileBlobStore::at_path(temp.path())?;

        let url = store.url(&BlobPath::new("inventory_images/Paper Towels.jpg")?)?;
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/objects/inventory_images/Paper%20Towels.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn test_public_url_is_percent_encoded() -> Result<(), BlobError> {
        let temp = TempDir::new().unwrap();
        let config = StashConfig::with_base_path(temp.path())
            .with_public_base_url("https://cdn.example.com/stock/");
        let store = FileBlobStore::new(config)?;

        let url = store.url(&BlobPath::new("inventory_images/Café #1.jpg")?)?;
        assert_eq!(
            url,
            "https://cdn.example.com/stock/inventory_images/Caf%C3%A9%20%231.jpg"
        );
        Ok(())
    }
}
