//! Item photo upload to the blob store.

use std::sync::Arc;

use blobstash::{BlobPath, BlobStore};
use stockconf::BlobsConfig;
use tracing::{info, warn};

use crate::capture::CapturedFrame;
use crate::codec::{EncodedImage, ImageCodec, MIME_JPEG};

/// Where item photos live in the blob store: `{prefix}/{name}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLayout {
    pub prefix: String,
    pub extension: String,
    pub content_type: String,
}

impl Default for BlobLayout {
    fn default() -> Self {
        Self {
            prefix: "inventory_images".to_string(),
            extension: "jpg".to_string(),
            content_type: MIME_JPEG.to_string(),
        }
    }
}

impl From<&BlobsConfig> for BlobLayout {
    fn from(config: &BlobsConfig) -> Self {
        Self {
            prefix: config.prefix.trim_matches('/').to_string(),
            extension: config.extension.trim_start_matches('.').to_string(),
            content_type: config.content_type.clone(),
        }
    }
}

impl BlobLayout {
    pub fn path_for(&self, key: &str) -> Result<BlobPath, blobstash::BlobError> {
        BlobPath::new(format!("{}/{}.{}", self.prefix, key, self.extension))
    }
}

/// Result of an upload. Failures are data here, not errors: the caller saves the item anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored { url: String, path: BlobPath },
    NoUrl(String),
}

impl UploadOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Stored { url, .. } => Some(url),
            Self::NoUrl(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct ImageUploader {
    blobs: Arc<dyn BlobStore>,
    codec: ImageCodec,
    layout: BlobLayout,
}

impl ImageUploader {
    pub fn new(blobs: Arc<dyn BlobStore>, codec: ImageCodec, layout: BlobLayout) -> Self {
        Self {
            blobs,
            codec,
            layout,
        }
    }

    pub fn layout(&self) -> &BlobLayout {
        &self.layout
    }

    pub fn encode(&self, frame: &CapturedFrame) -> Result<EncodedImage, crate::codec::CodecError> {
        self.codec.encode(frame, &self.layout.content_type)
    }

    /// Store `payload` under the blob path for `key`, replacing any previous photo there.
    pub async fn upload(&self, payload: &EncodedImage, key: &str) -> UploadOutcome {
        let path = match self.layout.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                warn!(item.name = %key, error = %e, "no valid blob path for item");
                return UploadOutcome::NoUrl(e.to_string());
            }
        };

        match self.blobs.put(&path, &payload.bytes, &payload.mime).await {
            Ok(reference) => {
                info!(
                    item.name = %key,
                    blob.path = %path,
                    blob.size = reference.size_bytes,
                    "uploaded item photo"
                );
                UploadOutcome::Stored {
                    url: reference.url,
                    path,
                }
            }
            Err(e) => {
                warn!(item.name = %key, blob.path = %path, error = %e, "photo upload failed");
                UploadOutcome::NoUrl(e.to_string())
            }
        }
    }

    pub async fn encode_and_upload(&self, frame: &CapturedFrame, key: &str) -> UploadOutcome {
        match self.encode(frame) {
            Ok(payload) => self.upload(&payload, key).await,
            Err(e) => {
                warn!(item.name = %key, error = %e, "photo encoding failed");
                UploadOutcome::NoUrl(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ImageUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUploader")
            .field("codec", &self.codec)
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobstash::MemoryBlobStore;
    use image::{Rgba, RgbaImage};

    fn frame() -> CapturedFrame {
        CapturedFrame::new(RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255])))
    }

    #[test]
    fn test_default_layout_path() {
        let path = BlobLayout::default().path_for("Widget").unwrap();
        assert_eq!(path.as_str(), "inventory_images/Widget.jpg");
    }

    #[test]
    fn test_layout_from_config_normalizes() {
        let config = BlobsConfig {
            prefix: "/photos/".to_string(),
            extension: ".png".to_string(),
            content_type: "image/png".to_string(),
            public_base_url: None,
        };
        let layout = BlobLayout::from(&config);
        assert_eq!(layout.path_for("a").unwrap().as_str(), "photos/a.png");
    }

    #[tokio::test]
    async fn test_upload_stores_under_item_name() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let uploader =
            ImageUploader::new(blobs.clone(), ImageCodec::default(), BlobLayout::default());

        let outcome = uploader.encode_and_upload(&frame(), "Widget").await;
        let UploadOutcome::Stored { url, path } = outcome else {
            panic!("expected stored, got {outcome:?}");
        };
        assert_eq!(path.as_str(), "inventory_images/Widget.jpg");
        assert!(url.ends_with("inventory_images/Widget.jpg"), "{url}");
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_key_gives_no_url() {
        let uploader = ImageUploader::new(
            Arc::new(MemoryBlobStore::new()),
            ImageCodec::default(),
            BlobLayout::default(),
        );
        let outcome = uploader.encode_and_upload(&frame(), "../escape").await;
        assert!(matches!(outcome, UploadOutcome::NoUrl(_)));
    }

    #[tokio::test]
    async fn test_unsupported_content_type_gives_no_url() {
        let layout = BlobLayout {
            content_type: "image/webp".to_string(),
            ..BlobLayout::default()
        };
        let blobs = Arc::new(MemoryBlobStore::new());
        let uploader = ImageUploader::new(blobs, ImageCodec::default(), layout);
        assert_eq!(uploader.encode_and_upload(&frame(), "Widget").await.url(), None);
    }
}
