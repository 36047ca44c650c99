//! Archive creation: writer, packager and format adapter.
//!
//! ```text
//! create_archive / convert
//!   └─ format::convert_with     resolve strategy, validate request
//!        ├─ Native              package straight into <output>
//!        └─ ExternalRepack      package into <output>.temp.zip, run rar/7z, remove temp
//!             └─ package::package_directory   walk → classify → decode → encode → write
//!                  └─ writer::ZipArchiveWriter
//! ```

pub mod format;
pub mod package;
pub mod writer;

pub use format::{ArchiveFormat, ExternalTool, Strategy, UnknownFormat, convert, convert_at};
pub use package::{BatchPosition, PackageOptions, package_directory};
pub use writer::{ArchiveWriter, EntryMeta, ZipArchiveWriter};

use crate::imaging::ImageError;
use crate::progress::NoProgress;
use crate::types::{ConversionRequest, ConversionResult};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("unable to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unable to convert {name} to WebP: {reason}")]
    Encode { name: String, reason: String },
    #[error("entry {name} from {} is already taken by {}", .path.display(), .first.display())]
    DuplicateEntry {
        name: String,
        first: PathBuf,
        path: PathBuf,
    },
    #[error("{tool} command not found. {hint}")]
    ToolNotFound {
        tool: &'static str,
        hint: &'static str,
    },
    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
    #[error("invalid conversion request: {0}")]
    InvalidRequest(String),
}

impl ArchiveError {
    /// Attach the source path to an imaging error.
    pub fn from_image(path: &Path, error: ImageError) -> Self {
        match error {
            ImageError::Io(source) => ArchiveError::Io {
                path: path.to_path_buf(),
                source,
            },
            ImageError::Decode(source) => ArchiveError::Decode {
                path: path.to_path_buf(),
                source,
            },
            ImageError::Encode(reason) => ArchiveError::Encode {
                name: path.display().to_string(),
                reason,
            },
        }
    }

    /// Decode, encode and name-clash failures concern a single file;
    /// everything else concerns the archive as a whole.
    pub fn is_entry_failure(&self) -> bool {
        matches!(
            self,
            ArchiveError::Decode { .. }
                | ArchiveError::Encode { .. }
                | ArchiveError::DuplicateEntry { .. }
        )
    }
}

/// Create `archive_path` from `source_dir` in the named format, without
/// progress reporting. Unknown format names fall back to ZIP.
pub fn create_archive(
    source_dir: &Path,
    archive_path: &Path,
    format: &str,
) -> Result<ConversionResult, ArchiveError> {
    let request = ConversionRequest::new(source_dir, archive_path, ArchiveFormat::resolve(format));
    convert(&request, &mut NoProgress)
}
