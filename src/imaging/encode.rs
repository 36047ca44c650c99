//! WebP transcoding.
//!
//! libwebp encodes whole frames, so the encoded image is built in memory and
//! then written to the sink in one go. Images without an alpha channel are
//! encoded from RGB8, everything else from RGBA8.

use super::{ImageError, Quality};
use image::DynamicImage;
use std::io::Write;

/// Lossy WebP encoder at a fixed quality.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpTranscoder {
    quality: Quality,
}

impl WebpTranscoder {
    /// Extension given to every transcoded entry.
    pub const EXTENSION: &'static str = "webp";
    /// Format label reported in progress events.
    pub const FORMAT_LABEL: &'static str = "WebP";

    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Encode into a new buffer.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ImageError::Encode(format!(
                "cannot encode empty image ({width}x{height})"
            )));
        }

        let quality = self.quality.as_webp();
        let encoded = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                .encode_simple(false, quality)
                .map(|memory| memory.to_vec())
        } else {
            let rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height)
                .encode_simple(false, quality)
                .map(|memory| memory.to_vec())
        };

        encoded.map_err(|e| ImageError::Encode(format!("{e:?}")))
    }

    /// Encode and write to `sink`. Returns the number of bytes written.
    pub fn encode_to(&self, image: &DynamicImage, sink: &mut dyn Write) -> Result<u64, ImageError> {
        let bytes = self.encode(image)?;
        sink.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }
}
