//! Shared test utilities: in-memory image fixtures, file setup and archive
//! inspection.
//!
//! Fixtures are generated with the `image` crate's own encoders, so tests
//! need no binary files on disk.

use crate::imaging::{DecodedImage, SourceFormat};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::{Cursor, Read};
use std::path::Path;

// =========================================================================
// Image fixtures
// =========================================================================

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128])
    }))
}

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Gif)
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Bmp)
}

/// A PNG cut off right after its header: recognisable, not decodable.
pub fn corrupt_png_bytes() -> Vec<u8> {
    let mut bytes = png_bytes(16, 16);
    bytes.truncate(40);
    bytes
}

/// An already-decoded blank RGB image.
pub fn decoded_rgb(width: u32, height: u32, format: SourceFormat) -> DecodedImage {
    DecodedImage {
        image: DynamicImage::ImageRgb8(RgbImage::new(width, height)),
        format,
    }
}

// =========================================================================
// Filesystem
// =========================================================================

/// Write `bytes` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, bytes: &[u8]) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

// =========================================================================
// Archive inspection
// =========================================================================

/// `(name, contents)` of every file entry, in archive order.
pub fn read_zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        entries.push((entry.name().to_string(), contents));
    }
    entries
}
