//! Palettes command implementation

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use crate::config::PixelateConfig;
use crate::registry::PaletteRegistry;

use super::{load_registry, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

#[derive(Serialize)]
struct ColorMatch<'a> {
    palette: &'a str,
    color: &'a str,
}

/// Execute the palettes command
pub fn run_palettes(
    mut config: PixelateConfig,
    name: Option<&str>,
    find: Option<&str>,
    json: bool,
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

    match (name, find) {
        (_, Some(hex)) => find_color(&registry, hex, json),
        (Some(name), None) => show_palette(&registry, name, json),
        (None, None) => list_palettes(&registry, json),
    }
}

fn list_palettes(registry: &PaletteRegistry, json: bool) -> ExitCode {
    if json {
        let counts: BTreeMap<&str, usize> = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.get(name).ok().map(|p| (name, p.len())))
            .collect();
        return print_json(&counts);
    }

    println!("Palettes:");
    for name in registry.names() {
        if let Ok(palette) = registry.get(name) {
            println!("  {} ({} colors)", name, palette.len());
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn show_palette(registry: &PaletteRegistry, name: &str, json: bool) -> ExitCode {
    let palette = match registry.get(name) {
        Ok(palette) => palette,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        let colors: BTreeMap<&str, &str> = palette.iter().collect();
        return print_json(&colors);
    }

    println!("Palette: {}", palette.name());
    println!();
    for (color, hex) in palette.iter() {
        println!("  {} => {}", color, hex);
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn find_color(registry: &PaletteRegistry, hex: &str, json: bool) -> ExitCode {
    let matches: Vec<ColorMatch> = registry
        .find_hex(hex)
        .into_iter()
        .map(|(palette, color)| ColorMatch { palette, color })
        .collect();

    if json {
        let code = print_json(&matches);
        return if matches.is_empty() { ExitCode::from(EXIT_ERROR) } else { code };
    }

    if matches.is_empty() {
        eprintln!("No palette color has the value '{}'", hex);
        return ExitCode::from(EXIT_ERROR);
    }

    for m in &matches {
        println!("{}:{}", m.palette, m.color);
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: Cannot serialize output: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
