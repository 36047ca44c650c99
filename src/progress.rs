//! Progress reporting capability.
//!
//! The pipeline calls a [`ProgressReporter`] synchronously at fixed points:
//! one [`FileEvent`] per archived file and a [`DirectoryProgress`] when a
//! conversion starts, after every file, on an image error and on completion.
//! Both methods default to no-ops, so reporters implement only what they
//! render.
//!
//! `mpsc::Sender<ProgressEvent>` is a reporter too: the CLI hands the
//! receiving end to a printer thread. A hung-up receiver is ignored, since
//! losing progress output must never fail a conversion.

use crate::imaging::SourceFormat;
use std::sync::mpsc::Sender;

/// One file was written to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Base name of the source file.
    pub file_name: String,
    /// Path relative to the conversion root.
    pub relative_path: String,
    /// Detected source format, images only.
    pub detected_format: Option<SourceFormat>,
    /// Target format label, images only.
    pub converted_to: Option<&'static str>,
    /// Entry name inside the archive.
    pub destination: String,
}

/// Where a conversion is within its directory and within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryProgress {
    /// 1-based index of the directory within the batch.
    pub current_index: usize,
    pub total: usize,
    pub current_name: String,
    pub processed_files: usize,
    pub total_files: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    File(FileEvent),
    Directory(DirectoryProgress),
}

pub trait ProgressReporter {
    fn file_processed(&mut self, _event: &FileEvent) {}

    fn directory_progress(&mut self, _progress: &DirectoryProgress) {}
}

/// Reporter that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

impl ProgressReporter for Sender<ProgressEvent> {
    fn file_processed(&mut self, event: &FileEvent) {
        let _ = self.send(ProgressEvent::File(event.clone()));
    }

    fn directory_progress(&mut self, progress: &DirectoryProgress) {
        let _ = self.send(ProgressEvent::Directory(progress.clone()));
    }
}
