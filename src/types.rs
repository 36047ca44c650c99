//! Shared types passed between the packager, the format adapter and the
//! batch orchestrator.

use crate::archive::ArchiveFormat;
use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A path discovered while walking the conversion root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Path relative to the conversion root.
    pub relative: PathBuf,
    pub is_dir: bool,
}

/// What ended up in the archive for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    /// Transcoded to WebP; `name` carries the `.webp` extension.
    Image { name: String },
    /// Copied verbatim under its original relative name.
    Opaque { name: String },
}

impl ArchiveEntry {
    pub fn name(&self) -> &str {
        match self {
            ArchiveEntry::Image { name } | ArchiveEntry::Opaque { name } => name,
        }
    }
}

/// What to do when a single image fails to decode or encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop and fail the whole archive.
    #[default]
    Abort,
    /// Record the failure, leave the file out and keep going.
    Skip,
}

/// One archive to build.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub format: ArchiveFormat,
    pub quality: Quality,
    pub failure_policy: FailurePolicy,
}

impl ConversionRequest {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        format: ArchiveFormat,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            format,
            quality: Quality::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// A file that was left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Relative path of the source file.
    pub name: String,
    pub reason: String,
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub archive_path: PathBuf,
    pub entries: Vec<ArchiveEntry>,
    pub failures: Vec<EntryFailure>,
}

impl ConversionResult {
    pub fn new(archive_path: &Path) -> Self {
        Self {
            archive_path: archive_path.to_path_buf(),
            entries: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn entries_written(&self) -> usize {
        self.entries.len()
    }

    pub fn images_converted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ArchiveEntry::Image { .. }))
            .count()
    }
}
