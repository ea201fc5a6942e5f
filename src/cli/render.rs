//! Render command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{merge_cli_overrides, CliOverrides, PixelateConfig};
use crate::output::OutputFormat;
use crate::pipeline::{DocumentStatus, Pixelator};

use super::{
    collect_inputs, load_registry, report_invalid_config, EXIT_ERROR, EXIT_INVALID_ARGS,
    EXIT_SUCCESS,
};

/// Render flags given on the command line
pub struct RenderArgs {
    pub block_size: Option<u32>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub recursive: bool,
    pub fail_fast: bool,
    pub skip_tokens: Vec<String>,
    pub palette_dirs: Vec<PathBuf>,
}

impl RenderArgs {
    fn overrides(self) -> CliOverrides {
        CliOverrides {
            block_size: self.block_size,
            format: self.format,
            output_dir: self.output,
            skip_tokens: self.skip_tokens,
            palette_dirs: self.palette_dirs,
            jobs: self.jobs.map(|j| j as usize),
            recursive: self.recursive.then_some(true),
            fail_fast: self.fail_fast.then_some(true),
        }
    }
}

/// Execute the render command
pub fn run_render(mut config: PixelateConfig, input: &Path, args: RenderArgs) -> ExitCode {
    merge_cli_overrides(&mut config, &args.overrides());
    if let Some(code) = report_invalid_config(&config) {
        return code;
    }

    let registry = match load_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let inputs = match collect_inputs(input, config.batch.recursive) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let pixelator = Pixelator::new(&registry)
        .with_render_options(config.render_options())
        .with_format(config.render.format)
        .with_output_dir(config.output.dir.clone())
        .with_jobs(config.batch.jobs)
        .with_fail_fast(config.batch.fail_fast);

    let result = pixelator.process_batch(&inputs);

    for document in &result.documents {
        match &document.status {
            DocumentStatus::Success => {
                if let Some(output) = &document.output {
                    println!("Saved: {}", output.display());
                }
            }
            DocumentStatus::Failed(error) => eprintln!("Error: {}", error),
            DocumentStatus::Skipped => eprintln!("Skipped: {}", document.path.display()),
        }
    }

    if result.documents.len() > 1 {
        eprintln!("{}", result.summary());
    }

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
