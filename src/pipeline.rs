//! Document processing: read, parse, render and save.
//!
//! [`Pixelator`] processes one document at a time or a batch of them. In a
//! batch, a failed document is recorded and processing moves on to the next
//! one, unless fail-fast mode is on. With more than one job the batch runs on
//! a rayon thread pool; the palette registry is the only shared state.
//!
//! # Example
//!
//! ```no_run
//! use pixelate::pipeline::Pixelator;
//! use pixelate::registry::PaletteRegistry;
//! use std::path::PathBuf;
//!
//! let registry = PaletteRegistry::builtin().unwrap();
//! let result = Pixelator::new(&registry)
//!     .with_jobs(4)
//!     .process_batch(&[PathBuf::from("art/heart.md")]);
//!
//! println!("{}", result.summary());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use image::RgbaImage;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Document;
use crate::output::{output_path, save_image, OutputError, OutputFormat};
use crate::parser::{parse_document, ParseError};
use crate::registry::PaletteRegistry;
use crate::renderer::{render_with_options, RenderError, RenderOptions};

/// Failure while processing a single document.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{}: cannot read document: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("{}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("{}: cannot write image: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: OutputError,
    },
}

impl ProcessError {
    /// The document (or, for output failures, the image) the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            ProcessError::Read { path, .. }
            | ProcessError::Parse { path, .. }
            | ProcessError::Render { path, .. }
            | ProcessError::Output { path, .. } => path,
        }
    }
}

/// Status of a single document in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Image written
    Success,
    /// Not attempted because an earlier document failed in fail-fast mode
    Skipped,
    /// Processing failed with error
    Failed(String),
}

impl DocumentStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, DocumentStatus::Failed(_))
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Success => write!(f, "success"),
            DocumentStatus::Skipped => write!(f, "skipped"),
            DocumentStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Outcome of processing one document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    /// Input document
    pub path: PathBuf,
    pub status: DocumentStatus,
    /// Image written, on success
    pub output: Option<PathBuf>,
    pub duration: Duration,
}

impl DocumentResult {
    pub fn success(path: PathBuf, output: PathBuf, duration: Duration) -> Self {
        Self { path, status: DocumentStatus::Success, output: Some(output), duration }
    }

    pub fn skipped(path: PathBuf) -> Self {
        Self { path, status: DocumentStatus::Skipped, output: None, duration: Duration::ZERO }
    }

    pub fn failed(path: PathBuf, error: String, duration: Duration) -> Self {
        Self { path, status: DocumentStatus::Failed(error), output: None, duration }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, DocumentStatus::Success)
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub documents: Vec<DocumentResult>,
    pub total_duration: Duration,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.documents.iter().filter(|r| r.is_success()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.documents.iter().filter(|r| matches!(r.status, DocumentStatus::Skipped)).count()
    }

    pub fn failed_count(&self) -> usize {
        self.documents.iter().filter(|r| r.status.is_failure()).count()
    }

    /// True when no document failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn outputs(&self) -> Vec<&PathBuf> {
        self.documents.iter().filter_map(|r| r.output.as_ref()).collect()
    }

    pub fn failures(&self) -> Vec<&DocumentResult> {
        self.documents.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// One-line summary of the batch.
    pub fn summary(&self) -> String {
        let total = self.documents.len();
        let failed = self.failed_count();
        if failed > 0 {
            format!(
                "Rendered {} of {} documents: {} failed, {} skipped",
                self.success_count(),
                total,
                failed,
                self.skipped_count()
            )
        } else {
            format!("Rendered {} documents in {:?}", total, self.total_duration)
        }
    }
}

/// Renders documents to image files.
#[derive(Debug, Clone)]
pub struct Pixelator<'a> {
    registry: &'a PaletteRegistry,
    options: RenderOptions,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    jobs: usize,
    fail_fast: bool,
}

impl<'a> Pixelator<'a> {
    /// Create a pixelator with default render options, PNG output next to each input, one job.
    pub fn new(registry: &'a PaletteRegistry) -> Self {
        Self {
            registry,
            options: RenderOptions::default(),
            format: OutputFormat::default(),
            output_dir: None,
            jobs: 1,
            fail_fast: false,
        }
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Write images into `dir` instead of next to their documents.
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set the number of parallel jobs used by [`Pixelator::process_batch`].
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Stop scheduling documents after the first failure.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Where the image for `input` will be written.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        output_path(input, self.format, self.output_dir.as_deref())
    }

    /// Read and parse a document without rendering it.
    pub fn check(&self, path: &Path) -> Result<Document, ProcessError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ProcessError::Read { path: path.to_path_buf(), source })?;
        parse_document(&text, self.registry)
            .map_err(|source| ProcessError::Parse { path: path.to_path_buf(), source })
    }

    /// Read, parse and render a document to an in-memory image.
    pub fn render(&self, path: &Path) -> Result<RgbaImage, ProcessError> {
        let document = self.check(path)?;
        render_with_options(&document.legend, &document.grid, &self.options)
            .map_err(|source| ProcessError::Render { path: path.to_path_buf(), source })
    }

    /// Render a document and save the image. Returns the output path.
    pub fn process(&self, path: &Path) -> Result<PathBuf, ProcessError> {
        let image = self.render(path)?;
        let output = self.output_path_for(path);
        save_image(&image, &output, self.format)
            .map_err(|source| ProcessError::Output { path: output.clone(), source })?;

        info!(
            input = %path.display(),
            output = %output.display(),
            width = image.width(),
            height = image.height(),
            "rendered document"
        );
        Ok(output)
    }

    /// Process every document, collecting a result for each.
    pub fn process_batch(&self, paths: &[PathBuf]) -> BatchResult {
        let start = Instant::now();
        let failed = AtomicBool::new(false);

        let documents = if self.jobs > 1 && paths.len() > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| {
                    paths
                        .par_iter()
                        .map(|path| self.process_entry(path, &failed))
                        .collect::<Vec<_>>()
                }),
                Err(e) => {
                    warn!(error = %e, "cannot start thread pool, processing sequentially");
                    self.process_sequential(paths, &failed)
                }
            }
        } else {
            self.process_sequential(paths, &failed)
        };

        let result = BatchResult { documents, total_duration: start.elapsed() };
        debug!(
            total = result.documents.len(),
            failed = result.failed_count(),
            skipped = result.skipped_count(),
            jobs = self.jobs,
            "batch finished"
        );
        result
    }

    fn process_sequential(&self, paths: &[PathBuf], failed: &AtomicBool) -> Vec<DocumentResult> {
        paths.iter().map(|path| self.process_entry(path, failed)).collect()
    }

    fn process_entry(&self, path: &Path, failed: &AtomicBool) -> DocumentResult {
        if self.fail_fast && failed.load(Ordering::SeqCst) {
            return DocumentResult::skipped(path.to_path_buf());
        }

        let start = Instant::now();
        match self.process(path) {
            Ok(output) => DocumentResult::success(path.to_path_buf(), output, start.elapsed()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to process document");
                failed.store(true, Ordering::SeqCst);
                DocumentResult::failed(path.to_path_buf(), e.to_string(), start.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CHECKER: &str = "+++\n\"1\" = \"#FF0000\"\n\"0\" = \"#00000000\"\n+++\n1,0,1\n0,1,0\n1,0,1\n";
    const BROKEN: &str = "+++\n\"1\" = \"#FF0000\"\n+++\n1,2\n";

    fn registry() -> PaletteRegistry {
        PaletteRegistry::builtin().expect("bundled palettes should load")
    }

    fn write_doc(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("should write document");
        path
    }

    #[test]
    fn test_process_writes_png_next_to_input() {
        let temp = TempDir::new().expect("should create temp dir");
        let input = write_doc(temp.path(), "checker.md", CHECKER);
        let registry = registry();

        let output = Pixelator::new(&registry).process(&input).unwrap();
        assert_eq!(output, temp.path().join("checker.png"));

        let image = image::open(&output).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (30, 30));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(15, 0).0[3], 0);
    }

    #[test]
    fn test_process_with_options() {
        let temp = TempDir::new().expect("should create temp dir");
        let input = write_doc(temp.path(), "checker.md", CHECKER);
        let out_dir = temp.path().join("out");
        let registry = registry();

        let output = Pixelator::new(&registry)
            .with_render_options(RenderOptions::default().with_block_size(2))
            .with_format(OutputFormat::Bmp)
            .with_output_dir(Some(out_dir.clone()))
            .process(&input)
            .unwrap();

        assert_eq!(output, out_dir.join("checker.bmp"));
        let image = image::open(&output).unwrap();
        assert_eq!((image.width(), image.height()), (6, 6));
    }

    #[test]
    fn test_check_returns_document() {
        let temp = TempDir::new().expect("should create temp dir");
        let input = write_doc(temp.path(), "checker.md", CHECKER);
        let registry = registry();

        let document = Pixelator::new(&registry).check(&input).unwrap();
        assert_eq!(document.grid.width(), 3);
        assert!(!temp.path().join("checker.png").exists());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let registry = registry();
        let missing = temp.path().join("missing.md");

        let err = Pixelator::new(&registry).process(&missing).unwrap_err();
        assert!(matches!(err, ProcessError::Read { .. }));
        assert_eq!(err.path(), missing.as_path());
    }

    #[test]
    fn test_parse_error_names_document() {
        let temp = TempDir::new().expect("should create temp dir");
        let input = write_doc(temp.path(), "broken.md", BROKEN);
        let registry = registry();

        let err = Pixelator::new(&registry).process(&input).unwrap_err();
        assert!(matches!(err, ProcessError::Parse { source: ParseError::UndefinedColorKey(_), .. }));
        assert!(err.to_string().contains("broken.md"));
        assert!(!temp.path().join("broken.png").exists());
    }

    #[test]
    fn test_render_error_is_reported() {
        let temp = TempDir::new().expect("should create temp dir");
        let input = write_doc(temp.path(), "checker.md", CHECKER);
        let registry = registry();

        let err = Pixelator::new(&registry)
            .with_render_options(RenderOptions::default().with_block_size(0))
            .process(&input)
            .unwrap_err();
        assert!(matches!(err, ProcessError::Render { source: RenderError::InvalidBlockSize(0), .. }));
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let temp = TempDir::new().expect("should create temp dir");
        let paths = vec![
            write_doc(temp.path(), "a.md", CHECKER),
            write_doc(temp.path(), "b.md", BROKEN),
            write_doc(temp.path(), "c.md", CHECKER),
        ];
        let registry = registry();

        let result = Pixelator::new(&registry).process_batch(&paths);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert_eq!(result.failures()[0].path, paths[1]);
        assert!(temp.path().join("c.png").exists());
        assert!(result.summary().contains("1 failed"));
    }

    #[test]
    fn test_batch_fail_fast_skips_rest() {
        let temp = TempDir::new().expect("should create temp dir");
        let paths = vec![
            write_doc(temp.path(), "a.md", BROKEN),
            write_doc(temp.path(), "b.md", CHECKER),
            write_doc(temp.path(), "c.md", CHECKER),
        ];
        let registry = registry();

        let result = Pixelator::new(&registry).with_fail_fast(true).process_batch(&paths);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.skipped_count(), 2);
        assert!(!temp.path().join("b.png").exists());
    }

    #[test]
    fn test_parallel_batch_keeps_input_order() {
        let temp = TempDir::new().expect("should create temp dir");
        let paths: Vec<PathBuf> = (0..8)
            .map(|i| write_doc(temp.path(), &format!("doc{}.md", i), CHECKER))
            .collect();
        let registry = registry();

        let result = Pixelator::new(&registry).with_jobs(4).process_batch(&paths);
        assert!(result.is_success());
        assert_eq!(result.outputs().len(), 8);
        let inputs: Vec<_> = result.documents.iter().map(|r| r.path.clone()).collect();
        assert_eq!(inputs, paths);
    }

    #[test]
    fn test_jobs_minimum_is_one() {
        let registry = registry();
        assert_eq!(Pixelator::new(&registry).with_jobs(0).jobs(), 1);
    }
}
