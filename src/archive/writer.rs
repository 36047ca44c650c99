//! Archive writer trait and the native ZIP implementation.
//!
//! The [`ArchiveWriter`] trait is the seam between the packager (which decides
//! *what* goes into the container) and the container format (which decides
//! *how* bytes are laid out). The packager is tested against a recording mock;
//! production uses [`ZipArchiveWriter`].
//!
//! `finish` and `abort` consume the writer, so nothing can be written after
//! the container is closed.
//!
//! ## Aborting without a footer
//!
//! `zip::ZipWriter` writes its central directory when dropped. An aborted
//! archive must not end up readable, so the file lives in a [`DetachableSink`]:
//! `abort` takes the file out, flushes and closes it, then forgets the zip
//! writer so its drop-time finalisation never runs. Only the writer's
//! in-memory entry list is leaked. The partial file itself is left on disk
//! for the caller to deal with.
//!
//! ## Timestamps
//!
//! Opaque entries keep the source file's modification time, converted to
//! UTC. Times outside the DOS range (1980 to 2107) fall back to the zip
//! default of "now".

use super::ArchiveError;
use crate::classify::webp_entry_name;
use crate::imaging::{DecodedImage, WebpTranscoder};
use std::cell::RefCell;
use std::fs::{File, Metadata};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use time::{OffsetDateTime, PrimitiveDateTime};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Sizes at or above this need ZIP64 extra fields.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// File metadata carried over to opaque entries where the container allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMeta {
    pub unix_mode: Option<u32>,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl EntryMeta {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        #[cfg(unix)]
        let unix_mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };
        #[cfg(not(unix))]
        let unix_mode = None;

        Self {
            unix_mode,
            size: Some(metadata.len()),
            modified: metadata.modified().ok(),
        }
    }

    /// Modification time as a DOS timestamp, if it fits.
    fn zip_time(&self) -> Option<DateTime> {
        let utc = OffsetDateTime::from(self.modified?);
        DateTime::try_from(PrimitiveDateTime::new(utc.date(), utc.time())).ok()
    }
}

pub trait ArchiveWriter {
    /// Path of the container being written.
    fn destination(&self) -> &Path;

    /// Transcode `image` and store it under `name` with its extension
    /// replaced. Returns the entry name actually used.
    fn add_image_entry(&mut self, name: &str, image: &DecodedImage) -> Result<String, ArchiveError>;

    /// Copy `content` verbatim under `name`. Returns the number of bytes
    /// copied.
    fn add_opaque_entry(
        &mut self,
        name: &str,
        content: &mut dyn Read,
        meta: EntryMeta,
    ) -> Result<u64, ArchiveError>;

    /// Write the central directory and close the container.
    fn finish(self) -> Result<(), ArchiveError>
    where
        Self: Sized;

    /// Abandon the container without finalising it.
    fn abort(self)
    where
        Self: Sized;
}

type SharedFile = Rc<RefCell<Option<BufWriter<File>>>>;

/// File sink whose file can be taken away from the zip writer that owns it.
/// Once detached, every write and seek fails.
struct DetachableSink {
    file: SharedFile,
}

impl DetachableSink {
    fn with_file<T>(&self, f: impl FnOnce(&mut BufWriter<File>) -> io::Result<T>) -> io::Result<T> {
        match self.file.borrow_mut().as_mut() {
            Some(file) => f(file),
            None => Err(io::Error::other("archive aborted")),
        }
    }
}

impl Write for DetachableSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl Seek for DetachableSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.with_file(|file| file.seek(pos))
    }
}

/// Native ZIP container writer. Every entry is Deflate-compressed.
pub struct ZipArchiveWriter {
    zip: ZipWriter<DetachableSink>,
    file: SharedFile,
    path: PathBuf,
    transcoder: WebpTranscoder,
}

impl ZipArchiveWriter {
    /// Create (or truncate) the file at `path` and start an empty archive.
    pub fn create(path: &Path, transcoder: WebpTranscoder) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SharedFile = Rc::new(RefCell::new(Some(BufWriter::new(file))));
        let sink = DetachableSink {
            file: Rc::clone(&file),
        };
        Ok(Self {
            zip: ZipWriter::new(sink),
            file,
            path: path.to_path_buf(),
            transcoder,
        })
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn destination(&self) -> &Path {
        &self.path
    }

    fn add_image_entry(&mut self, name: &str, image: &DecodedImage) -> Result<String, ArchiveError> {
        let webp_name = webp_entry_name(Path::new(name));
        // Encode before starting the entry so a failure leaves no half entry.
        let bytes = self
            .transcoder
            .encode(&image.image)
            .map_err(|e| ArchiveError::Encode {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.zip.start_file(webp_name.as_str(), Self::options())?;
        self.zip
            .write_all(&bytes)
            .map_err(|source| ArchiveError::Entry {
                name: webp_name.clone(),
                source,
            })?;
        Ok(webp_name)
    }

    fn add_opaque_entry(
        &mut self,
        name: &str,
        content: &mut dyn Read,
        meta: EntryMeta,
    ) -> Result<u64, ArchiveError> {
        let mut options = Self::options();
        if let Some(mode) = meta.unix_mode {
            options = options.unix_permissions(mode);
        }
        if meta.size.is_some_and(|size| size >= ZIP64_THRESHOLD) {
            options = options.large_file(true);
        }
        if let Some(modified) = meta.zip_time() {
            options = options.last_modified_time(modified);
        }

        self.zip.start_file(name, options)?;
        io::copy(content, &mut self.zip).map_err(|source| ArchiveError::Entry {
            name: name.to_string(),
            source,
        })
    }

    fn finish(self) -> Result<(), ArchiveError> {
        let path = self.path;
        let mut sink = self.zip.finish()?;
        sink.flush()
            .map_err(|source| ArchiveError::Io { path, source })
    }

    fn abort(self) {
        if let Some(mut file) = self.file.borrow_mut().take() {
            if let Err(e) = file.flush() {
                tracing::debug!("Flushing partial archive {} failed: {e}", self.path.display());
            }
        }
        std::mem::forget(self.zip);
        tracing::debug!("Abandoned partial archive {}", self.path.display());
    }
}
