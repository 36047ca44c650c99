//! Directory → archive packaging.
//!
//! Walks a source directory and feeds every file into an [`ArchiveWriter`]:
//! images (by extension) are decoded and transcoded to WebP, everything else is
//! copied verbatim. Directories themselves never become entries.
//!
//! ## Traversal order
//!
//! Depth-first, with the entries of each directory sorted by file name
//! (`WalkDir::sort_by_file_name`). Symlinks are not followed during the walk.
//!
//! ## Failure handling
//!
//! Under [`FailurePolicy::Abort`] the first image that fails to decode or
//! encode stops packaging: the writer is aborted (no central directory is
//! written) and the error is returned. The partial output file stays on disk.
//! Under [`FailurePolicy::Skip`] the file is left out and recorded in
//! [`ConversionResult::failures`]. I/O errors are always fatal.
//!
//! Two source files that map to the same entry name (`p01.jpg` and `p01.png`
//! both become `p01.webp`) are a per-file failure of the later one in
//! traversal order, handled by the same policy.

use super::ArchiveError;
use super::writer::{ArchiveWriter, EntryMeta};
use crate::classify::{entry_name, is_image_file, webp_entry_name};
use crate::imaging::{WebpTranscoder, decode_reader};
use crate::progress::{DirectoryProgress, FileEvent, ProgressReporter};
use crate::types::{ArchiveEntry, ConversionResult, EntryFailure, FailurePolicy, SourceEntry};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Position of the current conversion within a batch (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPosition {
    pub index: usize,
    pub total: usize,
}

impl BatchPosition {
    pub fn single() -> Self {
        Self { index: 1, total: 1 }
    }
}

impl Default for BatchPosition {
    fn default() -> Self {
        Self::single()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageOptions {
    pub failure_policy: FailurePolicy,
    pub position: BatchPosition,
}

/// Every entry below `root` (including `root` itself) in traversal order.
pub fn source_entries(root: &Path) -> impl Iterator<Item = Result<SourceEntry, ArchiveError>> + '_ {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(move |entry| {
            let entry = entry?;
            let path = entry.path().to_path_buf();
            let relative = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            Ok(SourceEntry {
                is_dir: entry.file_type().is_dir(),
                path,
                relative,
            })
        })
}

/// Number of non-directory entries below `root`.
pub fn count_files(root: &Path) -> Result<usize, ArchiveError> {
    let mut count = 0;
    for entry in source_entries(root) {
        if !entry?.is_dir {
            count += 1;
        }
    }
    Ok(count)
}

/// Package `source_dir` into `writer` and finalise it.
pub fn package_directory<W: ArchiveWriter>(
    source_dir: &Path,
    mut writer: W,
    reporter: &mut dyn ProgressReporter,
    options: &PackageOptions,
) -> Result<ConversionResult, ArchiveError> {
    let mut packager = Packager {
        source_dir,
        reporter,
        options,
        progress: DirectoryProgress {
            current_index: options.position.index,
            total: options.position.total,
            current_name: display_name(source_dir),
            processed_files: 0,
            total_files: 0,
            message: String::new(),
        },
        result: ConversionResult::new(writer.destination()),
        written: HashMap::new(),
    };

    match packager.run(&mut writer) {
        Ok(()) => {
            writer.finish()?;
            let name = packager.progress.current_name.clone();
            packager.report(format!("Completed {name}"));
            Ok(packager.result)
        }
        Err(e) => {
            writer.abort();
            Err(e)
        }
    }
}

struct Packager<'a> {
    source_dir: &'a Path,
    reporter: &'a mut dyn ProgressReporter,
    options: &'a PackageOptions,
    progress: DirectoryProgress,
    result: ConversionResult,
    /// Entry name → source file that claimed it.
    written: HashMap<String, PathBuf>,
}

impl Packager<'_> {
    fn run(&mut self, writer: &mut impl ArchiveWriter) -> Result<(), ArchiveError> {
        self.progress.total_files = count_files(self.source_dir)?;
        let name = self.progress.current_name.clone();
        self.report(format!("Starting conversion of {name}..."));

        for entry in source_entries(self.source_dir) {
            let entry = entry?;
            if entry.is_dir {
                continue;
            }

            let file_name = file_name_of(&entry);
            let is_image = is_image_file(&entry.path);
            let destination = if is_image {
                webp_entry_name(&entry.relative)
            } else {
                entry_name(&entry.relative)
            };

            let outcome = match self.written.get(&destination) {
                Some(first) => Err(ArchiveError::DuplicateEntry {
                    name: destination,
                    first: first.clone(),
                    path: entry.path.clone(),
                }),
                None if is_image => add_image(writer, &entry),
                None => add_opaque(writer, &entry),
            };
            let event = match outcome {
                Ok(event) => event,
                Err(e) if e.is_entry_failure() => {
                    self.report(format!("Error converting {file_name}: {e}"));
                    match self.options.failure_policy {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Skip => {
                            tracing::warn!("Skipping {}: {e}", entry.path.display());
                            self.result.failures.push(EntryFailure {
                                name: entry_name(&entry.relative),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    }
                }
                Err(e) => return Err(e),
            };

            tracing::debug!("Added {} -> {}", event.relative_path, event.destination);
            self.written.insert(event.destination.clone(), entry.path.clone());
            self.result.entries.push(match event.converted_to {
                Some(_) => ArchiveEntry::Image {
                    name: event.destination.clone(),
                },
                None => ArchiveEntry::Opaque {
                    name: event.destination.clone(),
                },
            });
            self.reporter.file_processed(&event);
            self.progress.processed_files += 1;
            self.report(format!("Processing {file_name}..."));
        }
        Ok(())
    }

    fn report(&mut self, message: String) {
        self.progress.message = message;
        self.reporter.directory_progress(&self.progress);
    }
}

fn add_image(writer: &mut impl ArchiveWriter, entry: &SourceEntry) -> Result<FileEvent, ArchiveError> {
    let file = open(&entry.path)?;
    let decoded = decode_reader(BufReader::new(file))
        .map_err(|e| ArchiveError::from_image(&entry.path, e))?;
    let destination = writer.add_image_entry(&entry_name(&entry.relative), &decoded)?;
    Ok(FileEvent {
        file_name: file_name_of(entry),
        relative_path: entry_name(&entry.relative),
        detected_format: Some(decoded.format),
        converted_to: Some(WebpTranscoder::FORMAT_LABEL),
        destination,
    })
}

fn add_opaque(writer: &mut impl ArchiveWriter, entry: &SourceEntry) -> Result<FileEvent, ArchiveError> {
    let file = open(&entry.path)?;
    let meta = file
        .metadata()
        .map(|m| EntryMeta::from_metadata(&m))
        .map_err(|source| ArchiveError::Io {
            path: entry.path.clone(),
            source,
        })?;
    let name = entry_name(&entry.relative);
    writer.add_opaque_entry(&name, &mut BufReader::new(file), meta)?;
    Ok(FileEvent {
        file_name: file_name_of(entry),
        relative_path: name.clone(),
        detected_format: None,
        converted_to: None,
        destination: name,
    })
}

fn open(path: &Path) -> Result<File, ArchiveError> {
    File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name_of(entry: &SourceEntry) -> String {
    entry
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn display_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
