//! Batch conversion: one archive per directory below a root.
//!
//! Every directory under the root (at any depth, the root itself excluded) is
//! converted into `<parent>/<name>.<format>`, one after another. A failing
//! directory is recorded and the batch moves on. With `delete_originals`, a
//! directory is removed right after its archive was written successfully.
//!
//! Directories are listed up front, parents before children, siblings sorted
//! by name. Nested directories therefore end up both inside their parent's
//! archive and in an archive of their own. When originals are deleted, a
//! child whose parent is already gone fails with an invalid-request error.

use crate::archive::{ArchiveError, ArchiveFormat, BatchPosition, convert_at};
use crate::config::ConverterConfig;
use crate::imaging::Quality;
use crate::progress::ProgressReporter;
use crate::types::{ConversionRequest, ConversionResult, FailurePolicy};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Format as requested; also used verbatim (lowercased) as the archive
    /// extension.
    pub format_label: String,
    pub quality: Quality,
    pub failure_policy: FailurePolicy,
    pub delete_originals: bool,
}

impl BatchOptions {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            format_label: config.archive.format.clone(),
            quality: Quality::new(config.images.quality),
            failure_policy: config.archive.on_image_error,
            delete_originals: config.archive.delete_originals,
        }
    }

    fn extension(&self) -> String {
        self.format_label.trim().to_ascii_lowercase()
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: Vec<ConversionResult>,
    pub failed: Vec<(PathBuf, ArchiveError)>,
    pub deleted: Vec<PathBuf>,
    pub delete_errors: Vec<(PathBuf, std::io::Error)>,
}

/// All directories below `root`, parents first, siblings sorted by name.
pub fn collect_directories(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// `<parent>/<dirname>.<extension>`
pub fn archive_path_for(dir: &Path, extension: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{name}.{extension}"))
}

/// Convert every directory below `root`.
///
/// Only listing the directories can fail the batch as a whole; per-directory
/// errors end up in [`BatchSummary::failed`].
pub fn convert_subdirectories(
    root: &Path,
    options: &BatchOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<BatchSummary, ArchiveError> {
    let directories = collect_directories(root)?;
    let format = ArchiveFormat::resolve(&options.format_label);
    let extension = options.extension();

    let mut summary = BatchSummary {
        total: directories.len(),
        ..Default::default()
    };

    for (i, dir) in directories.iter().enumerate() {
        let request = ConversionRequest::new(dir, archive_path_for(dir, &extension), format)
            .with_quality(options.quality)
            .with_failure_policy(options.failure_policy);
        let position = BatchPosition {
            index: i + 1,
            total: directories.len(),
        };

        match convert_at(&request, position, reporter) {
            Ok(result) => {
                summary.completed.push(result);
                if options.delete_originals {
                    match std::fs::remove_dir_all(dir) {
                        Ok(()) => summary.deleted.push(dir.clone()),
                        Err(e) => {
                            tracing::warn!("Error deleting directory {}: {e}", dir.display());
                            summary.delete_errors.push((dir.clone(), e));
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Error creating {} for {}: {e}",
                    extension.to_uppercase(),
                    dir.display()
                );
                summary.failed.push((dir.clone(), e));
            }
        }
    }

    Ok(summary)
}
