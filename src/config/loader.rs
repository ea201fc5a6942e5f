//! Configuration loading and discovery for `pixelate.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PixelateConfig;
use crate::output::OutputFormat;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "pixelate.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pixelate.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override block size
    pub block_size: Option<u32>,
    /// Override output format
    pub format: Option<OutputFormat>,
    /// Override output directory
    pub output_dir: Option<PathBuf>,
    /// Additional skip tokens
    pub skip_tokens: Vec<String>,
    /// Additional palette directories
    pub palette_dirs: Vec<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    pub recursive: Option<bool>,
    pub fail_fast: Option<bool>,
}

/// Find pixelate.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pixelate.toml
/// 2. Check XDG_CONFIG_HOME/pixelate/pixelate.toml (or ~/.config/pixelate/pixelate.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pixelate.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixelate").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find pixelate.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// If a path is provided, loads from that file (a missing file is an error).
/// Otherwise uses [`find_config`], falling back to the defaults when no file
/// is found. Relative directories in the file are resolved against the
/// file's own directory.
///
/// # Example
/// ```no_run
/// use pixelate::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Some(Path::new("art/pixelate.toml"))).unwrap();
/// println!("block size: {}", config.render.block_size);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<PixelateConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => {
            debug!("no pixelate.toml found, using defaults");
            Ok(PixelateConfig::default())
        }
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<PixelateConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: PixelateConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(root) = project_root(path) {
        config.resolve_paths(root);
    }

    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values; list values are
/// appended.
pub fn merge_cli_overrides(config: &mut PixelateConfig, overrides: &CliOverrides) {
    if let Some(block_size) = overrides.block_size {
        config.render.block_size = block_size;
    }

    if let Some(format) = overrides.format {
        config.render.format = format;
    }

    if let Some(ref dir) = overrides.output_dir {
        config.output.dir = Some(dir.clone());
    }

    config.render.skip_tokens.extend(overrides.skip_tokens.iter().cloned());
    config.palettes.dirs.extend(overrides.palette_dirs.iter().cloned());

    if let Some(jobs) = overrides.jobs {
        config.batch.jobs = jobs;
    }
    if let Some(recursive) = overrides.recursive {
        config.batch.recursive = recursive;
    }
    if let Some(fail_fast) = overrides.fail_fast {
        config.batch.fail_fast = fail_fast;
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the pixelate.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
