//! Check command implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::PixelateConfig;
use crate::models::Document;
use crate::pipeline::Pixelator;

use super::{collect_inputs, load_registry, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the check command
///
/// With `json`, a single document prints as `{"legend": ..., "grid": ...}`;
/// a directory prints an object keyed by document path.
pub fn run_check(
    mut config: PixelateConfig,
    input: &Path,
    json: bool,
    recursive: bool,
    palette_dirs: Vec<PathBuf>,
) -> ExitCode {
    config.palettes.dirs.extend(palette_dirs);

    let registry = match load_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let inputs = match collect_inputs(input, recursive || config.batch.recursive) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let pixelator = Pixelator::new(&registry);
    let mut documents: BTreeMap<String, Document> = BTreeMap::new();
    let mut failed = 0;

    for path in &inputs {
        match pixelator.check(path) {
            Ok(document) => {
                if !json {
                    println!(
                        "{}: OK ({}x{} cells, {} colors)",
                        path.display(),
                        document.grid.width(),
                        document.grid.height(),
                        document.legend.len()
                    );
                }
                documents.insert(path.display().to_string(), document);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    if json {
        let rendered = if input.is_file() {
            documents.values().next().map(serde_json::to_string_pretty)
        } else {
            Some(serde_json::to_string_pretty(&documents))
        };
        match rendered {
            Some(Ok(text)) => println!("{}", text),
            Some(Err(e)) => {
                eprintln!("Error: Cannot serialize documents: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
            None => {}
        }
    }

    if failed > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
