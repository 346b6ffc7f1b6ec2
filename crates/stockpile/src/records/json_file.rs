//! JSON file record store.
//!
//! One file per collection at `{state_dir}/{collection}.json`, holding an object that maps
//! item names to documents. Reads go to disk every time and never lock: the collection is only
//! ever replaced by rename, so a reader sees either the old file or the new one.
//!
//! Writes are read-modify-write of the whole file, so they hold an exclusive advisory lock on
//! `{collection}.lock` from load to rename. That lock is what keeps two processes (or two
//! store instances in one process) from dropping each other's changes. Each write publishes
//! through its own uniquely named temp file.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::item::{InventoryItem, ItemFields};
use crate::records::document::{self, Document};
use crate::records::{RecordStore, WriteMode};

type Collection = BTreeMap<String, Document>;

#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    // Keeps this instance's writers from queueing on the blocking pool behind the file lock.
    write_lock: Mutex<()>,
}

impl JsonFileRecordStore {
    /// Store for `collection` under `state_dir`. Nothing is created until the first write.
    pub fn new(state_dir: impl AsRef<Path>, collection: &str) -> Self {
        Self::at_file(state_dir.as_ref().join(format!("{collection}.json")))
    }

    pub fn at_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Collection, StoreError> {
        decode_collection(&self.path, tokio::fs::read(&self.path).await)
    }

    /// Run `change` against the current collection under the cross-process lock.
    /// `change` returns its result and whether the collection needs saving.
    async fn update<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection) -> Result<(T, bool), StoreError> + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || update_locked(&path, change))
            .await
            .map_err(|e| StoreError::Unavailable(format!("collection update task failed: {e}")))?
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

fn decode_collection(
    path: &Path,
    read: std::io::Result<Vec<u8>>,
) -> Result<Collection, StoreError> {
    let bytes = match read {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Collection::new()),
        Err(source) => return Err(io_error(path)(source)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Collection::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Exclusive advisory lock on the collection's lock file. Released on drop.
struct CollectionLock {
    file: File,
}

impl CollectionLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(io_error(path))?;
        FileExt::lock_exclusive(&file).map_err(io_error(path))?;
        Ok(Self { file })
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn update_locked<T>(
    path: &Path,
    change: impl FnOnce(&mut Collection) -> Result<(T, bool), StoreError>,
) -> Result<T, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let _lock = CollectionLock::acquire(&path.with_extension("lock"))?;
    let mut collection = decode_collection(path, std::fs::read(path))?;
    let (value, changed) = change(&mut collection)?;
    if changed {
        publish(path, &collection)?;
    }
    Ok(value)
}

fn publish(path: &Path, collection: &Collection) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(collection)?;
    let temp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));

    let written = std::fs::write(&temp_path, json)
        .map_err(io_error(&temp_path))
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(io_error(path)));
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written?;

    debug!(path = %path.display(), documents = collection.len(), "saved collection");
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let collection = self.load().await?;
        Ok(document::decode_all(collection.iter()))
    }

    async fn get(&self, name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let collection = self.load().await?;
        document::lookup(name, collection.get(name))
    }

    async fn put(&self, name: &str, fields: ItemFields, mode: WriteMode) -> Result<(), StoreError> {
        let name = name.to_string();
        self.update(move |collection| {
            if let Some(created) = document::apply(collection.get_mut(&name), fields, mode)? {
                collection.insert(name, created);
            }
            Ok(((), true))
        })
        .await
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.update(move |collection| {
            let existed = collection.remove(&name).is_some();
            Ok((existed, existed))
        })
        .await
    }
}
