//! CLI output formatting.
//!
//! Each kind of output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ```text
//! [1/2] Starting conversion of vol1...
//!     ✓ 001.jpg (JPEG) → 001.webp
//!     ✓ credits.txt → credits.txt
//! [1/2] Completed vol1 (2/2 files)
//! [2/2] Error converting broken.png: unable to decode image ...
//!
//! Converted 1 of 2 directories
//!     Failed: comics/vol2
//!         unable to decode image ...
//! ```

use crate::batch::BatchSummary;
use crate::progress::{DirectoryProgress, FileEvent, ProgressEvent};
use crate::types::ConversionResult;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn file_line(event: &FileEvent) -> String {
    match &event.detected_format {
        Some(format) => format!(
            "{}\u{2713} {} ({}) \u{2192} {}",
            indent(1),
            event.relative_path,
            format,
            event.destination
        ),
        None => format!(
            "{}\u{2713} {} \u{2192} {}",
            indent(1),
            event.relative_path,
            event.destination
        ),
    }
}

fn directory_line(progress: &DirectoryProgress) -> String {
    let position = format!("[{}/{}]", progress.current_index, progress.total);
    if progress.processed_files > 0 {
        format!(
            "{position} {} ({}/{} files)",
            progress.message, progress.processed_files, progress.total_files
        )
    } else {
        format!("{position} {}", progress.message)
    }
}

/// Format a single progress event as display lines.
pub fn format_progress_event(event: &ProgressEvent) -> Vec<String> {
    match event {
        ProgressEvent::File(file) => vec![file_line(file)],
        // Per-file "Processing" updates duplicate the file lines.
        ProgressEvent::Directory(d) if d.message.starts_with("Processing ") => Vec::new(),
        ProgressEvent::Directory(d) => vec![directory_line(d)],
    }
}

/// Format the outcome of a single conversion.
pub fn format_conversion_result(result: &ConversionResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Created {} ({}, {} converted)",
        result.archive_path.display(),
        plural(result.entries_written(), "entry", "entries"),
        plural(result.images_converted(), "image", "images"),
    )];
    for failure in &result.failures {
        lines.push(format!("{}Skipped: {}", indent(1), failure.name));
        lines.push(format!("{}{}", indent(2), failure.reason));
    }
    lines
}

/// Format the outcome of a batch run.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Converted {} of {}",
        summary.completed.len(),
        plural(summary.total, "directory", "directories")
    )];
    for result in &summary.completed {
        for failure in &result.failures {
            lines.push(format!(
                "{}Skipped: {} in {}",
                indent(1),
                failure.name,
                result.archive_path.display()
            ));
        }
    }
    for (dir, error) in &summary.failed {
        lines.push(format!("{}Failed: {}", indent(1), dir.display()));
        lines.push(format!("{}{}", indent(2), error));
    }
    if !summary.deleted.is_empty() {
        lines.push(format!(
            "Deleted {}",
            plural(summary.deleted.len(), "source directory", "source directories")
        ));
    }
    for (dir, error) in &summary.delete_errors {
        lines.push(format!("{}Not deleted: {}", indent(1), dir.display()));
        lines.push(format!("{}{}", indent(2), error));
    }
    lines
}

/// Print a progress event to stdout.
pub fn print_progress_event(event: &ProgressEvent) {
    for line in format_progress_event(event) {
        println!("{}", line);
    }
}

/// Print a conversion result to stdout.
pub fn print_conversion_result(result: &ConversionResult) {
    for line in format_conversion_result(result) {
        println!("{}", line);
    }
}

/// Print a batch summary to stdout.
pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveError;
    use crate::imaging::SourceFormat;
    use crate::types::{ArchiveEntry, EntryFailure};
    use std::path::{Path, PathBuf};

    fn directory(message: &str, processed: usize) -> ProgressEvent {
        ProgressEvent::Directory(DirectoryProgress {
            current_index: 2,
            total: 3,
            current_name: "vol2".into(),
            processed_files: processed,
            total_files: 4,
            message: message.into(),
        })
    }

    #[test]
    fn image_file_line_shows_detected_format() {
        let event = ProgressEvent::File(FileEvent {
            file_name: "001.png".into(),
            relative_path: "ch1/001.png".into(),
            detected_format: Some(SourceFormat::Png),
            converted_to: Some("WebP"),
            destination: "ch1/001.webp".into(),
        });
        assert_eq!(
            format_progress_event(&event),
            vec!["    \u{2713} ch1/001.png (PNG) \u{2192} ch1/001.webp"]
        );
    }

    #[test]
    fn opaque_file_line_has_no_format() {
        let event = ProgressEvent::File(FileEvent {
            file_name: "info.txt".into(),
            relative_path: "info.txt".into(),
            detected_format: None,
            converted_to: None,
            destination: "info.txt".into(),
        });
        assert_eq!(
            format_progress_event(&event),
            vec!["    \u{2713} info.txt \u{2192} info.txt"]
        );
    }

    #[test]
    fn directory_lines_carry_batch_position() {
        assert_eq!(
            format_progress_event(&directory("Starting conversion of vol2...", 0)),
            vec!["[2/3] Starting conversion of vol2..."]
        );
        assert_eq!(
            format_progress_event(&directory("Completed vol2", 4)),
            vec!["[2/3] Completed vol2 (4/4 files)"]
        );
    }

    #[test]
    fn processing_updates_are_not_printed() {
        assert!(format_progress_event(&directory("Processing a.jpg...", 1)).is_empty());
    }

    #[test]
    fn conversion_result_lists_skipped_files() {
        let mut result = ConversionResult::new(Path::new("out.cbz"));
        result.entries.push(ArchiveEntry::Image {
            name: "a.webp".into(),
        });
        result.failures.push(EntryFailure {
            name: "b.png".into(),
            reason: "bad data".into(),
        });
        let lines = format_conversion_result(&result);
        assert_eq!(lines[0], "Created out.cbz (1 entry, 1 image converted)");
        assert_eq!(lines[1], "    Skipped: b.png");
        assert_eq!(lines[2], "        bad data");
    }

    #[test]
    fn batch_summary_reports_failures_and_deletions() {
        let summary = BatchSummary {
            total: 2,
            completed: vec![ConversionResult::new(Path::new("a.cbz"))],
            failed: vec![(
                PathBuf::from("b"),
                ArchiveError::InvalidRequest("gone".into()),
            )],
            deleted: vec![PathBuf::from("a")],
            delete_errors: Vec::new(),
        };
        let lines = format_batch_summary(&summary);
        assert_eq!(
            lines,
            vec![
                "Converted 1 of 2 directories",
                "    Failed: b",
                "        invalid conversion request: gone",
                "Deleted 1 source directory",
            ]
        );
    }
}
