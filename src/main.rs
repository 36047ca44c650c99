use cbz_webp::archive::{ArchiveFormat, convert};
use cbz_webp::batch::{BatchOptions, archive_path_for, convert_subdirectories};
use cbz_webp::config::{self, ConverterConfig};
use cbz_webp::imaging::Quality;
use cbz_webp::output;
use cbz_webp::progress::ProgressEvent;
use cbz_webp::types::{ConversionRequest, FailurePolicy};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Flags shared by commands that build archives. Each one overrides the
/// matching config value when given.
#[derive(clap::Args, Clone)]
struct ArchiveArgs {
    /// Archive format: cbz/zip, cbr/rar, cb7z/7z
    #[arg(long)]
    format: Option<String>,

    /// WebP quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Leave undecodable images out instead of failing the archive
    #[arg(long)]
    skip_bad_images: bool,
}

#[derive(Parser)]
#[command(name = "cbz-webp")]
#[command(about = "Pack comic page directories into CBZ/CBR/CB7Z archives with WebP images")]
#[command(long_about = "\
Pack comic page directories into CBZ/CBR/CB7Z archives with WebP images

Every image (jpg, jpeg, png, gif) is re-encoded as lossy WebP and stored
under the same relative path with a .webp extension. All other files are
copied unchanged. Directory layout is preserved inside the archive.

  comics/
  ├── vol1/                 → comics/vol1.cbz
  │   ├── 001.jpg           →   001.webp
  │   ├── 002.png           →   002.webp
  │   └── credits.txt       →   credits.txt
  └── vol2/                 → comics/vol2.cbz

CBR and CB7Z need the `rar` or `7z` command on PATH.

Settings are read from ./cbz-webp.toml (or --config). Run
'cbz-webp gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./cbz-webp.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every directory below ROOT into its own archive
    Batch {
        /// Directory whose subdirectories are converted
        root: PathBuf,

        #[command(flatten)]
        archive: ArchiveArgs,

        /// Delete each source directory after its archive was written
        #[arg(long)]
        delete_original_files: bool,
    },
    /// Convert a single directory into an archive
    Pack {
        /// Directory to convert
        source: PathBuf,

        /// Output archive (default: <parent>/<name>.<format>)
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        archive: ArchiveArgs,
    },
    /// Print a stock cbz-webp.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Batch {
            root,
            archive,
            delete_original_files,
        } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            apply_overrides(&mut config, &archive)?;
            if delete_original_files {
                config.archive.delete_originals = true;
            }
            let options = BatchOptions::from_config(&config);

            let (mut tx, printer) = spawn_printer();
            let summary = convert_subdirectories(&root, &options, &mut tx);
            drop(tx);
            join_printer(printer)?;
            let summary = summary?;

            println!();
            output::print_batch_summary(&summary);
            if !summary.failed.is_empty() {
                return Err(format!(
                    "{} of {} directories failed",
                    summary.failed.len(),
                    summary.total
                )
                .into());
            }
        }
        Command::Pack {
            source,
            output: output_path,
            archive,
        } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            apply_overrides(&mut config, &archive)?;

            let label = config.archive.format.trim().to_ascii_lowercase();
            let output_path = output_path.unwrap_or_else(|| default_output(&source, &label));
            let request = ConversionRequest::new(
                &source,
                &output_path,
                ArchiveFormat::resolve(&config.archive.format),
            )
            .with_quality(Quality::new(config.images.quality))
            .with_failure_policy(config.archive.on_image_error);

            let (mut tx, printer) = spawn_printer();
            let result = convert(&request, &mut tx);
            drop(tx);
            join_printer(printer)?;

            output::print_conversion_result(&result?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer command-line flags over the loaded config and re-validate.
fn apply_overrides(
    config: &mut ConverterConfig,
    args: &ArchiveArgs,
) -> Result<(), config::ConfigError> {
    if let Some(format) = &args.format {
        config.archive.format = format.clone();
    }
    if let Some(quality) = args.quality {
        config.images.quality = quality;
    }
    if args.skip_bad_images {
        config.archive.on_image_error = FailurePolicy::Skip;
    }
    config.validate()
}

/// `<parent>/<name>.<label>`, resolving `.` and friends so the archive gets
/// a real name.
fn default_output(source: &Path, label: &str) -> PathBuf {
    let source = source
        .canonicalize()
        .unwrap_or_else(|_| source.to_path_buf());
    archive_path_for(&source, label)
}

fn spawn_printer() -> (Sender<ProgressEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<ProgressEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_progress_event(&event);
        }
    });
    (tx, printer)
}

fn join_printer(printer: JoinHandle<()>) -> Result<(), Box<dyn std::error::Error>> {
    printer
        .join()
        .map_err(|_| "progress printer thread panicked".into())
}
