//! Image decoding and WebP transcoding: pure Rust decoders, libwebp encoder.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Classify** | extension check in [`crate::classify`] |
//! | **Decode** | `image::load_from_memory_with_format`, JPEG → PNG → GIF → guessed |
//! | **Encode → WebP** | `webp::Encoder::encode_simple` (lossy, fixed quality) |
//!
//! The module is split into:
//! - **Decode**: [`decode_bytes`] / [`decode_reader`] and the [`SourceFormat`] tag
//! - **Encode**: [`WebpTranscoder`]
//! - **Parameters**: [`Quality`]

pub mod decode;
pub mod encode;
mod params;

pub use decode::{DecodedImage, SourceFormat, decode_bytes, decode_reader};
pub use encode::WebpTranscoder;
pub use params::Quality;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("WebP encode failed: {0}")]
    Encode(String),
}
