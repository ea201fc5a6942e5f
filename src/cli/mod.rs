//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod check;
mod palettes;
mod render;

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, PixelateConfig};
use crate::discovery::{discover_documents, is_document};
use crate::output::OutputFormat;
use crate::palettes::PaletteError;
use crate::registry::PaletteRegistry;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Pixelate - Render pixel art from markdown documents with a TOML color legend
#[derive(Parser)]
#[command(name = "pixelate")]
#[command(about = "Pixelate - Render pixel art from markdown documents with a TOML color legend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a pixelate.toml (default: search upwards from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render documents to images
    Render {
        /// A .md document or a directory of documents
        input: PathBuf,

        /// Edge length of one grid cell in pixels (default: 10)
        #[arg(short = 's', long, visible_alias = "pixel-size", value_parser = clap::value_parser!(u32).range(1..))]
        block_size: Option<u32>,

        /// Output image format (default: png)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Directory for rendered images (default: next to each document)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Number of documents rendered in parallel
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        jobs: Option<u32>,

        /// Search subdirectories when INPUT is a directory
        #[arg(short, long)]
        recursive: bool,

        /// Stop after the first failed document
        #[arg(long)]
        fail_fast: bool,

        /// Leave cells with this token transparent (repeatable)
        #[arg(long = "skip-token", value_name = "TOKEN")]
        skip_tokens: Vec<String>,

        /// Extra directory of palette files (repeatable)
        #[arg(long = "palette-dir", value_name = "DIR")]
        palette_dirs: Vec<PathBuf>,
    },

    /// Parse and validate documents without rendering
    Check {
        /// A .md document or a directory of documents
        input: PathBuf,

        /// Print the resolved legend and grid as JSON
        #[arg(long)]
        json: bool,

        /// Search subdirectories when INPUT is a directory
        #[arg(short, long)]
        recursive: bool,

        /// Extra directory of palette files (repeatable)
        #[arg(long = "palette-dir", value_name = "DIR")]
        palette_dirs: Vec<PathBuf>,
    },

    /// List palettes, show one palette, or find a color by hex value
    Palettes {
        /// Palette to show
        name: Option<String>,

        /// Find palette colors with this hex value (e.g. #1F77B4)
        #[arg(long, value_name = "HEX", conflicts_with = "name")]
        find: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Extra directory of palette files (repeatable)
        #[arg(long = "palette-dir", value_name = "DIR")]
        palette_dirs: Vec<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match cli.command {
        Commands::Render {
            input,
            block_size,
            format,
            output,
            jobs,
            recursive,
            fail_fast,
            skip_tokens,
            palette_dirs,
        } => render::run_render(
            config,
            &input,
            render::RenderArgs {
                block_size,
                format,
                output,
                jobs,
                recursive,
                fail_fast,
                skip_tokens,
                palette_dirs,
            },
        ),
        Commands::Check { input, json, recursive, palette_dirs } => {
            check::run_check(config, &input, json, recursive, palette_dirs)
        }
        Commands::Palettes { name, find, json, palette_dirs } => {
            palettes::run_palettes(config, name.as_deref(), find.as_deref(), json, palette_dirs)
        }
    }
}

/// Install the stderr log subscriber.
fn init_logging(verbose: u8, quiet: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(log_level(verbose, quiet), env_directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .init();
}

fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// `RUST_LOG` directives when set and valid, otherwise the flag-derived level.
fn log_filter(level: Level, env_directives: Option<&str>) -> EnvFilter {
    env_directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

/// Build the palette registry: bundled palettes plus every configured directory.
pub(crate) fn load_registry(config: &PixelateConfig) -> Result<PaletteRegistry, PaletteError> {
    let mut registry = PaletteRegistry::builtin()?;
    for dir in &config.palettes.dirs {
        registry.load_dir(dir)?;
    }
    Ok(registry)
}

/// Expand INPUT into the documents to process.
///
/// A file must carry the `.md` extension; a directory must contain at least
/// one document.
pub(crate) fn collect_inputs(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, String> {
    if input.is_dir() {
        let files = discover_documents(input, recursive).map_err(|e| e.to_string())?;
        if files.is_empty() {
            return Err(format!("No .md documents found in '{}'", input.display()));
        }
        Ok(files)
    } else if input.is_file() {
        if !is_document(input) {
            return Err(format!("'{}' is not a .md document", input.display()));
        }
        Ok(vec![input.to_path_buf()])
    } else {
        Err(format!("Input '{}' does not exist", input.display()))
    }
}

/// Print configuration problems and return the invalid-arguments exit code.
pub(crate) fn report_invalid_config(config: &PixelateConfig) -> Option<ExitCode> {
    let errors = config.validate();
    if errors.is_empty() {
        return None;
    }
    for error in errors {
        eprintln!("Error: {}", error);
    }
    Some(ExitCode::from(EXIT_INVALID_ARGS))
}
