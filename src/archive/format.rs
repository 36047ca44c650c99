//! Archive format selection and the external repack path.
//!
//! | Requested | Strategy | Command |
//! |---|---|---|
//! | `zip`, `cbz` | native | |
//! | `rar`, `cbr` | external repack | `rar a -ep1 <output> <output>.temp.zip` |
//! | `7z`, `cb7z` | external repack | `7z a -t7z <output> <output>.temp.zip` |
//!
//! The strategy is resolved once per request. External formats are produced
//! by packaging a native ZIP next to the output and handing it to the tool.
//! The intermediate ZIP is owned by a [`TempFileGuard`] and removed when the
//! conversion returns, whatever the outcome.

use super::ArchiveError;
use super::package::{BatchPosition, PackageOptions, package_directory};
use super::writer::ZipArchiveWriter;
use crate::imaging::WebpTranscoder;
use crate::progress::ProgressReporter;
use crate::types::{ConversionRequest, ConversionResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArchiveFormat {
    Zip,
    Rar,
    SevenZip,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown archive format '{0}' (expected cbz/zip, cbr/rar or cb7z/7z)")]
pub struct UnknownFormat(pub String);

impl FromStr for ArchiveFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" | "cbz" => Ok(ArchiveFormat::Zip),
            "rar" | "cbr" => Ok(ArchiveFormat::Rar),
            "7z" | "cb7z" => Ok(ArchiveFormat::SevenZip),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for ArchiveFormat {
    type Error = UnknownFormat;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArchiveFormat> for String {
    fn from(format: ArchiveFormat) -> Self {
        format.comic_extension().to_string()
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Rar => "RAR",
            ArchiveFormat::SevenZip => "7Z",
        })
    }
}

impl ArchiveFormat {
    /// Lenient parse: unknown names log a warning and fall back to ZIP.
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown format '{name}', defaulting to ZIP");
            ArchiveFormat::Zip
        })
    }

    pub fn comic_extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "cbz",
            ArchiveFormat::Rar => "cbr",
            ArchiveFormat::SevenZip => "cb7z",
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            ArchiveFormat::Zip => Strategy::Native,
            ArchiveFormat::Rar => Strategy::ExternalRepack(RAR),
            ArchiveFormat::SevenZip => Strategy::ExternalRepack(SEVEN_ZIP),
        }
    }
}

/// External archiver invoked as `<program> <args...> <output> <input>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTool {
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub install_hint: &'static str,
}

pub const RAR: ExternalTool = ExternalTool {
    program: "rar",
    args: &["a", "-ep1"],
    install_hint: "Please install WinRAR or RAR for Linux/Mac",
};

pub const SEVEN_ZIP: ExternalTool = ExternalTool {
    program: "7z",
    args: &["a", "-t7z"],
    install_hint: "Please install p7zip",
};

impl ExternalTool {
    fn command(&self, resolved: &Path, output: &Path, input: &Path) -> Command {
        let mut cmd = Command::new(resolved);
        cmd.args(self.args).arg(output).arg(input);
        cmd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Native,
    ExternalRepack(ExternalTool),
}

/// `<output>.temp.zip`
pub fn temp_path_for(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".temp.zip");
    PathBuf::from(name)
}

/// Removes the wrapped file on drop.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {e}", self.0.display()),
        }
    }
}

/// Build one archive as described by `request`.
pub fn convert(
    request: &ConversionRequest,
    reporter: &mut dyn ProgressReporter,
) -> Result<ConversionResult, ArchiveError> {
    convert_at(request, BatchPosition::single(), reporter)
}

/// [`convert`], reporting `position` in directory progress events.
pub fn convert_at(
    request: &ConversionRequest,
    position: BatchPosition,
    reporter: &mut dyn ProgressReporter,
) -> Result<ConversionResult, ArchiveError> {
    convert_with(request, position, reporter, |program| which::which(program).ok())
}

pub(crate) fn convert_with(
    request: &ConversionRequest,
    position: BatchPosition,
    reporter: &mut dyn ProgressReporter,
    resolve_tool: impl Fn(&str) -> Option<PathBuf>,
) -> Result<ConversionResult, ArchiveError> {
    validate(request)?;

    let options = PackageOptions {
        failure_policy: request.failure_policy,
        position,
    };
    let transcoder = WebpTranscoder::new(request.quality);
    let output = &request.output_path;

    match request.format.strategy() {
        Strategy::Native => {
            let writer = ZipArchiveWriter::create(output, transcoder)?;
            let result = package_directory(&request.source_dir, writer, reporter, &options)?;
            tracing::info!("Created {}: {}", request.format, output.display());
            Ok(result)
        }
        Strategy::ExternalRepack(tool) => {
            let resolved = resolve_tool(tool.program).ok_or(ArchiveError::ToolNotFound {
                tool: tool.program,
                hint: tool.install_hint,
            })?;

            let temp = TempFileGuard(temp_path_for(output));
            let writer = ZipArchiveWriter::create(&temp.0, transcoder)?;
            let mut result = package_directory(&request.source_dir, writer, reporter, &options)?;

            let run = tool
                .command(&resolved, output, &temp.0)
                .output()
                .map_err(|source| ArchiveError::Io {
                    path: resolved.clone(),
                    source,
                })?;
            if !run.status.success() {
                return Err(ArchiveError::ExternalTool {
                    tool: tool.program,
                    status: run.status,
                    stderr: String::from_utf8_lossy(&run.stderr).trim().to_string(),
                });
            }

            tracing::info!("Created {}: {}", request.format, output.display());
            result.archive_path = output.clone();
            Ok(result)
        }
    }
}

fn validate(request: &ConversionRequest) -> Result<(), ArchiveError> {
    let invalid = |msg: String| Err(ArchiveError::InvalidRequest(msg));

    if !request.source_dir.is_dir() {
        return invalid(format!(
            "source {} is not a directory",
            request.source_dir.display()
        ));
    }

    let output = &request.output_path;
    let Some(file_name) = output.file_name() else {
        return invalid(format!("output {} has no file name", output.display()));
    };
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return invalid(format!(
            "output directory {} does not exist",
            parent.display()
        ));
    }

    let canonical = |path: &Path| {
        path.canonicalize().map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let source = canonical(&request.source_dir)?;
    let output = canonical(parent)?.join(file_name);
    if output.starts_with(&source) {
        return invalid(format!(
            "output {} collides with source directory {}",
            output.display(),
            source.display()
        ));
    }
    Ok(())
}
