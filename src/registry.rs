//! Palette registry for resolving `palette:color` references
//!
//! The registry is built once at startup (bundled palettes plus any palette
//! directories from the configuration) and then shared by reference. Nothing
//! mutates it after construction, so concurrent readers need no locking.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glob::glob;
use tracing::debug;

use crate::palettes::{self, Palette, PaletteError};

/// Registry of named palettes, keyed by lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    palettes: BTreeMap<String, Palette>,
}

impl PaletteRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self { palettes: BTreeMap::new() }
    }

    /// Create a registry holding every bundled palette.
    ///
    /// A failure here means a bundled palette table is malformed and should
    /// abort startup.
    pub fn builtin() -> Result<Self, PaletteError> {
        let mut registry = Self::new();
        for name in palettes::list_builtins() {
            if let Some(palette) = palettes::get_builtin(name) {
                registry.register(palette?)?;
            }
        }
        Ok(registry)
    }

    /// Register a palette. Names are unique; re-registering is an error.
    pub fn register(&mut self, palette: Palette) -> Result<(), PaletteError> {
        let name = palette.name().to_string();
        if self.palettes.contains_key(&name) {
            return Err(PaletteError::DuplicatePalette(name));
        }
        debug!(palette = %name, colors = palette.len(), "registered palette");
        self.palettes.insert(name, palette);
        Ok(())
    }

    /// Load every `*.toml` file in `dir` as a palette named after its file stem.
    ///
    /// Returns the number of palettes loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, PaletteError> {
        if !dir.is_dir() {
            return Err(PaletteError::Io {
                path: dir.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let escaped = glob::Pattern::escape(&dir.to_string_lossy());
        let pattern = Path::new(&escaped).join("*.toml");
        let paths = glob(&pattern.to_string_lossy()).map_err(|e| PaletteError::InvalidDefinition {
            palette: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut files: Vec<_> = paths.filter_map(Result::ok).filter(|p| p.is_file()).collect();
        files.sort();

        for path in &files {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = fs::read_to_string(path)
                .map_err(|source| PaletteError::Io { path: path.clone(), source })?;
            self.register(Palette::from_toml_str(&name, &source)?)?;
        }

        Ok(files.len())
    }

    /// Check whether a palette is loaded (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.palettes.contains_key(&name.to_lowercase())
    }

    /// Look up a palette by name (case-insensitive).
    pub fn get(&self, name: &str) -> Result<&Palette, PaletteError> {
        self.palettes.get(&name.to_lowercase()).ok_or_else(|| PaletteError::UnknownPalette {
            name: name.to_string(),
            available: self.names().iter().map(|n| n.to_string()).collect(),
        })
    }

    /// Names of all loaded palettes, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.palettes.keys().map(String::as_str).collect()
    }

    /// All `(palette, color)` pairs whose value is `hex`.
    pub fn find_hex(&self, hex: &str) -> Vec<(&str, &str)> {
        self.palettes
            .values()
            .filter_map(|palette| palette.name_of(hex).map(|color| (palette.name(), color)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}
