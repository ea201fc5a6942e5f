//! Integration tests for the pixelate library
//!
//! These tests run fixture documents through the parse → render → save
//! pipeline and check the resulting images and errors.

use std::fs;
use std::path::{Path, PathBuf};

use pixelate::color::ColorError;
use pixelate::discovery::discover_documents;
use pixelate::output::OutputFormat;
use pixelate::parser::{parse_document, ParseError};
use pixelate::pipeline::{Pixelator, ProcessError};
use pixelate::registry::PaletteRegistry;
use pixelate::renderer::{render, RenderOptions};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn registry() -> PaletteRegistry {
    PaletteRegistry::builtin().expect("bundled palettes should load")
}

/// Copy a fixture into a temp dir so outputs land there.
fn stage(temp: &TempDir, name: &str) -> PathBuf {
    let target = temp.path().join(name);
    fs::copy(fixture(name), &target).expect("should copy fixture");
    target
}

#[test]
fn test_checker_fixture_renders_30x30() {
    let text = fs::read_to_string(fixture("checker.md")).unwrap();
    let document = parse_document(&text, &registry()).unwrap();

    let image = render(&document.legend, &document.grid, 10).unwrap();
    assert_eq!(image.dimensions(), (30, 30));

    for (row, col, red) in [(0, 0, true), (0, 1, false), (1, 1, true), (2, 1, false), (2, 2, true)] {
        let pixel = image.get_pixel(col * 10 + 5, row * 10 + 5);
        if red {
            assert_eq!(pixel.0, [255, 0, 0, 255], "cell ({}, {})", row, col);
        } else {
            assert_eq!(pixel.0[3], 0, "cell ({}, {})", row, col);
        }
    }
}

#[test]
fn test_palette_reference_renders_single_block() {
    let document = parse_document("+++\n\"1\" = \"tableau:blue\"\n+++\n1\n", &registry()).unwrap();
    let image = render(&document.legend, &document.grid, 10).unwrap();

    assert_eq!(image.dimensions(), (10, 10));
    assert!(image.pixels().all(|p| p.0 == [0x1F, 0x77, 0xB4, 255]));
}

#[test]
fn test_heart_fixture_uses_palettes() {
    let text = fs::read_to_string(fixture("heart.md")).unwrap();
    let document = parse_document(&text, &registry()).unwrap();

    assert_eq!(document.legend.get("r"), Some("#D62728"));
    assert_eq!(document.legend.get("d"), Some("#8B0000"));
    assert_eq!(document.legend.get("w"), Some("#FFFFFF"));
    assert!(!document.legend.contains("version"));
    assert_eq!((document.grid.width(), document.grid.height()), (7, 6));

    let image = render(&document.legend, &document.grid, 2).unwrap();
    assert_eq!(image.dimensions(), (14, 12));
    // Row 1, column 1 is the white highlight
    assert_eq!(image.get_pixel(3, 3).0, [255, 255, 255, 255]);
}

#[test]
fn test_undefined_key_fixture() {
    let text = fs::read_to_string(fixture("undefined_key.md")).unwrap();
    let err = parse_document(&text, &registry()).unwrap_err();
    assert_eq!(err, ParseError::UndefinedColorKey(vec!["2".to_string(), "3".to_string()]));
}

#[test]
fn test_ragged_fixture_reports_line() {
    let text = fs::read_to_string(fixture("ragged.md")).unwrap();
    let err = parse_document(&text, &registry()).unwrap_err();
    assert_eq!(err, ParseError::InconsistentColumnCount { line: 5, expected: 3, found: 2 });
}

#[test]
fn test_unknown_color_fixture_lists_palette_colors() {
    let text = fs::read_to_string(fixture("unknown_color.md")).unwrap();
    let err = parse_document(&text, &registry()).unwrap_err();

    match &err {
        ParseError::InvalidColor { key, source: ColorError::UnknownPaletteColor { total, .. }, .. } => {
            assert_eq!(key, "1");
            assert_eq!(*total, 10);
        }
        other => panic!("expected unknown palette color, got {:?}", other),
    }
    assert!(err.to_string().contains("Available colors:"));
}

#[test]
fn test_user_palette_directory() {
    let temp = TempDir::new().expect("should create temp dir");
    let palette_dir = temp.path().join("palettes");
    fs::create_dir_all(&palette_dir).unwrap();
    fs::write(palette_dir.join("Brand.toml"), "primary = \"#123456\"\naccent = \"abcdef\"\n").unwrap();

    let mut registry = registry();
    assert_eq!(registry.load_dir(&palette_dir).unwrap(), 1);

    let document =
        parse_document("+++\np = \"brand:Primary\"\na = \"BRAND:accent\"\n+++\np,a\n", &registry)
            .unwrap();
    assert_eq!(document.legend.get("p"), Some("#123456"));
    assert_eq!(document.legend.get("a"), Some("#ABCDEF"));
}

#[test]
fn test_directory_batch_with_failures() {
    let temp = TempDir::new().expect("should create temp dir");
    for name in ["checker.md", "heart.md", "ragged.md", "undefined_key.md"] {
        stage(&temp, name);
    }
    fs::write(temp.path().join("readme.txt"), "not a document").unwrap();

    let documents = discover_documents(temp.path(), false).unwrap();
    assert_eq!(documents.len(), 4);

    let registry = registry();
    let out_dir = temp.path().join("out");
    let result = Pixelator::new(&registry)
        .with_output_dir(Some(out_dir.clone()))
        .with_jobs(2)
        .process_batch(&documents);

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.failed_count(), 2);
    assert!(out_dir.join("checker.png").exists());
    assert!(out_dir.join("heart.png").exists());
    assert!(!out_dir.join("ragged.png").exists());
}

#[test]
fn test_process_single_with_format_and_skip_token() {
    let temp = TempDir::new().expect("should create temp dir");
    let input = stage(&temp, "heart.md");
    let registry = registry();

    let output = Pixelator::new(&registry)
        .with_render_options(RenderOptions::default().with_block_size(1).with_skip_tokens(["w"]))
        .with_format(OutputFormat::Tiff)
        .process(&input)
        .unwrap();

    assert_eq!(output, temp.path().join("heart.tiff"));
    let image = image::open(&output).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (7, 6));
    assert_eq!(image.get_pixel(1, 1).0[3], 0);
    assert_eq!(image.get_pixel(1, 0).0, [0xD6, 0x27, 0x28, 255]);
}

#[test]
fn test_process_error_carries_path() {
    let temp = TempDir::new().expect("should create temp dir");
    let input = stage(&temp, "unknown_color.md");
    let registry = registry();

    let err = Pixelator::new(&registry).process(&input).unwrap_err();
    assert!(matches!(err, ProcessError::Parse { .. }));
    assert_eq!(err.path(), input.as_path());
}
