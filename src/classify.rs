//! Extension-based file classification and archive entry naming.
//!
//! Classification never looks at file content. The decoder does its own
//! content-based format detection, so a mislabelled file that passes here
//! still decodes correctly (or fails loudly).

use crate::imaging::WebpTranscoder;
use std::path::{Component, Path};

/// Extensions (lowercase, no dot) that are converted to WebP.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Whether `path` names a convertible image.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Archive entry name for a path relative to the conversion root.
///
/// Components are joined with `/` regardless of platform.
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Entry name for a transcoded image: the relative path with its extension
/// replaced by `.webp`.
pub fn webp_entry_name(relative: &Path) -> String {
    entry_name(&relative.with_extension(WebpTranscoder::EXTENSION))
}
