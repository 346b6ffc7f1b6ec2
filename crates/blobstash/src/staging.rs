//! Staged writes: bytes land in `staging/` under a random id, then get published into
//! `objects/` with a rename so readers never see a partial file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::BlobError;

/// An in-flight upload.
///
/// Dropping an unpublished write removes its staging file.
#[derive(Debug)]
pub struct StagedWrite {
    id: String,
    path: PathBuf,
    published: bool,
}

impl StagedWrite {
    /// Write `data` to a fresh staging file under `staging_dir`.
    pub async fn create(staging_dir: &Path, data: &[u8]) -> Result<Self, BlobError> {
        fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| BlobError::io(staging_dir, e))?;

        let id = Uuid::new_v4().simple().to_string();
        let path = staging_dir.join(&id);
        // Built before the file so a failed write still cleans up on drop.
        let staged = Self {
            id,
            path,
            published: false,
        };

        let mut file = fs::File::create(&staged.path)
            .await
            .map_err(|e| BlobError::io(&staged.path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| BlobError::io(&staged.path, e))?;
        file.sync_all()
            .await
            .map_err(|e| BlobError::io(&staged.path, e))?;

        Ok(staged)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the staged bytes to `dest`, replacing whatever is there.
    ///
    /// Tries `rename` first and falls back to copy + remove across filesystems.
    pub async fn publish(mut self, dest: &Path) -> Result<(), BlobError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::io(parent, e))?;
        }

        match fs::rename(&self.path, dest).await {
            Ok(()) => {}
            Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
                fs::copy(&self.path, dest)
                    .await
                    .map_err(|e| BlobError::io(dest, e))?;
                fs::remove_file(&self.path)
                    .await
                    .map_err(|e| BlobError::io(&self.path, e))?;
            }
            Err(e) => return Err(BlobError::io(dest, e)),
        }

        self.published = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.published {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
