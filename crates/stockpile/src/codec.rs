//! Snapshot encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;
use thiserror::Error;

use crate::capture::CapturedFrame;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported image format {0:?}")]
    UnsupportedFormat(String),

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Encodes captured frames. Same frame and settings always give the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCodec {
    jpeg_quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(85)
    }
}

impl ImageCodec {
    /// `jpeg_quality` is clamped to 1-100.
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn encode(&self, frame: &CapturedFrame, mime: &str) -> Result<EncodedImage, CodecError> {
        let mut bytes = Vec::new();
        match mime {
            MIME_JPEG => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgba8(frame.image.clone()).to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
                DynamicImage::ImageRgb8(rgb).write_with_encoder(encoder)?;
            }
            MIME_PNG => {
                DynamicImage::ImageRgba8(frame.image.clone())
                    .write_with_encoder(PngEncoder::new(&mut bytes))?;
            }
            other => return Err(CodecError::UnsupportedFormat(other.to_string())),
        }
        Ok(EncodedImage {
            bytes,
            mime: mime.to_string(),
        })
    }
}
