//! Configuration schema types for `pixelate.toml`
//!
//! Every section and field is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::loader::resolve_path;
use crate::output::OutputFormat;
use crate::renderer::{RenderOptions, DEFAULT_BLOCK_SIZE};

/// Rendering defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Edge length of one grid cell, in pixels
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Output image format
    #[serde(default)]
    pub format: OutputFormat,
    /// Tokens left transparent regardless of their legend color
    #[serde(default)]
    pub skip_tokens: Vec<String>,
}

fn default_block_size() -> u32 {
    DEFAULT_BLOCK_SIZE
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            format: OutputFormat::default(),
            skip_tokens: Vec::new(),
        }
    }
}

/// Output location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for rendered images; next to each document when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Extra palette sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalettesConfig {
    /// Directories scanned for `*.toml` palette files
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// Directory processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of parallel jobs
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
    /// Stop after the first failed document
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_jobs() -> usize {
    1
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { jobs: default_jobs(), recursive: false, fail_fast: false }
    }
}

/// Complete `pixelate.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelateConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub palettes: PalettesConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// A configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "render.block_size")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pixelate.toml: '{}' {}", self.field, self.message)
    }
}

impl PixelateConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.render.block_size == 0 {
            errors.push(ConfigValidationError {
                field: "render.block_size".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.render.skip_tokens.iter().any(|t| t.trim().is_empty()) {
            errors.push(ConfigValidationError {
                field: "render.skip_tokens".to_string(),
                message: "must not contain empty tokens".to_string(),
            });
        }

        if self.batch.jobs == 0 {
            errors.push(ConfigValidationError {
                field: "batch.jobs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Make relative directories absolute against `root` (the config file's directory).
    pub fn resolve_paths(&mut self, root: &Path) {
        if let Some(dir) = self.output.dir.as_mut() {
            *dir = resolve_path(root, dir);
        }
        for dir in &mut self.palettes.dirs {
            *dir = resolve_path(root, dir);
        }
    }

    /// Renderer options described by the `[render]` section.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
            .with_block_size(self.render.block_size)
            .with_skip_tokens(self.render.skip_tokens.iter().cloned())
    }
}
