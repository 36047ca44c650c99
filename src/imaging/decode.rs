//! Content-based image decoding with a fixed fallback chain.
//!
//! File extensions are not trusted: a `.jpg` that is really a PNG still
//! decodes. Every attempt starts from the beginning of the same in-memory
//! buffer, so callers holding a non-seekable reader go through
//! [`decode_reader`], which buffers first.
//!
//! Attempt order:
//!
//! 1. JPEG
//! 2. PNG
//! 3. GIF (first frame)
//! 4. whatever the `image` crate guesses from the magic bytes
//!
//! The first success wins. If everything fails, the error from the last
//! attempt is returned.

use super::ImageError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fmt;
use std::io::{Cursor, Read};

const DECODE_ORDER: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

/// Source format detected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    /// Decoded by the generic fallback; carries the format name.
    Other(String),
}

impl From<ImageFormat> for SourceFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => SourceFormat::Jpeg,
            ImageFormat::Png => SourceFormat::Png,
            ImageFormat::Gif => SourceFormat::Gif,
            other => SourceFormat::Other(format!("{other:?}").to_uppercase()),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Jpeg => f.write_str("JPEG"),
            SourceFormat::Png => f.write_str("PNG"),
            SourceFormat::Gif => f.write_str("GIF"),
            SourceFormat::Other(name) => f.write_str(name),
        }
    }
}

/// A decoded pixel buffer plus the format it was decoded from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode an in-memory image, trying each codec in turn.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, ImageError> {
    for format in DECODE_ORDER {
        match image::load_from_memory_with_format(bytes, format) {
            Ok(image) => {
                return Ok(DecodedImage {
                    image,
                    format: format.into(),
                });
            }
            Err(e) => tracing::trace!("{format:?} decode attempt failed: {e}"),
        }
    }

    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let guessed = reader.format();
    let image = reader.decode().map_err(ImageError::Decode)?;
    let format = guessed
        .map(SourceFormat::from)
        .unwrap_or_else(|| SourceFormat::Other("UNKNOWN".to_string()));
    Ok(DecodedImage { image, format })
}

/// Buffer a reader fully, then decode it with [`decode_bytes`].
pub fn decode_reader(mut reader: impl Read) -> Result<DecodedImage, ImageError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_bytes(&bytes)
}
