//! Named color palettes.
//!
//! A [`Palette`] maps lower-cased color names to `#RRGGBB` values and keeps the
//! reverse mapping alongside it. Both directions are filled by the same
//! insertion, so a palette can never hold two names for one color or one name
//! for two colors.
//!
//! The built-in palettes are compiled into the binary from `assets/*.toml`
//! and referenced from documents as `palette:color` (e.g. `tableau:blue`).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Built-in palette definitions: (name, TOML source).
const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("base", include_str!("assets/base.toml")),
    ("css4", include_str!("assets/css4.toml")),
    ("tableau", include_str!("assets/tableau.toml")),
    ("xkcd", include_str!("assets/xkcd.toml")),
];

/// Which side of a palette entry collided with an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// The color name is already defined
    Name,
    /// The hex value already belongs to another name
    Hex,
    /// The name is identical to its own hex value
    SelfMapping,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Name => write!(f, "name is already defined"),
            Conflict::Hex => write!(f, "value is already used by another name"),
            Conflict::SelfMapping => write!(f, "name and value cannot be the same"),
        }
    }
}

/// Errors raised while building palettes or the palette registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PaletteError {
    /// A name or hex value appears twice in one palette
    #[error("duplicate color definition in palette '{palette}': '{name}' = '{hex}' ({conflict})")]
    DuplicateColorDefinition { palette: String, name: String, hex: String, conflict: Conflict },
    /// A palette file could not be decoded or holds a malformed value
    #[error("invalid palette definition '{palette}': {message}")]
    InvalidDefinition { palette: String, message: String },
    /// Lookup of a palette that was never loaded
    #[error("palette '{name}' not found. Available palettes: {}", available.join(", "))]
    UnknownPalette { name: String, available: Vec<String> },
    /// Two palettes registered under the same name
    #[error("palette '{0}' is already registered")]
    DuplicatePalette(String),
    /// A palette file or directory could not be read
    #[error("failed to read palette file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An immutable, append-only bidirectional color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: String,
    by_name: BTreeMap<String, String>,
    by_hex: HashMap<String, String>,
}

impl Palette {
    /// Create an empty palette. The name is lower-cased.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            by_name: BTreeMap::new(),
            by_hex: HashMap::new(),
        }
    }

    /// Build a palette from `"name" = "#RRGGBB"` TOML lines.
    pub fn from_toml_str(name: &str, source: &str) -> Result<Self, PaletteError> {
        let mut palette = Palette::new(name);
        let table: toml::Table = toml::from_str(source).map_err(|e| {
            PaletteError::InvalidDefinition { palette: palette.name.clone(), message: e.to_string() }
        })?;

        for (color_name, value) in table {
            let Some(hex) = value.as_str() else {
                return Err(PaletteError::InvalidDefinition {
                    palette: palette.name.clone(),
                    message: format!("value of '{}' must be a string, found {}", color_name, value.type_str()),
                });
            };
            palette.insert(&color_name, hex)?;
        }

        Ok(palette)
    }

    /// Add a color. Rejects a taken name, a taken value, or a name equal to its value.
    pub fn insert(&mut self, color_name: &str, hex: &str) -> Result<(), PaletteError> {
        let color_name = color_name.trim().to_lowercase();
        let hex = normalize_palette_hex(hex).ok_or_else(|| PaletteError::InvalidDefinition {
            palette: self.name.clone(),
            message: format!("'{}' = '{}' is not a #RRGGBB color", color_name, hex),
        })?;

        let conflict = if color_name.eq_ignore_ascii_case(&hex) {
            Some(Conflict::SelfMapping)
        } else if self.by_name.contains_key(&color_name) {
            Some(Conflict::Name)
        } else if self.by_hex.contains_key(&hex) {
            Some(Conflict::Hex)
        } else {
            None
        };

        if let Some(conflict) = conflict {
            return Err(PaletteError::DuplicateColorDefinition {
                palette: self.name.clone(),
                name: color_name,
                hex,
                conflict,
            });
        }

        self.by_hex.insert(hex.clone(), color_name.clone());
        self.by_name.insert(color_name, hex);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex value for a color name (case-insensitive).
    pub fn get(&self, color_name: &str) -> Option<&str> {
        self.by_name.get(&color_name.to_lowercase()).map(String::as_str)
    }

    /// Color name for a hex value, the reverse of [`Palette::get`].
    pub fn name_of(&self, hex: &str) -> Option<&str> {
        let hex = normalize_palette_hex(hex)?;
        self.by_hex.get(&hex).map(String::as_str)
    }

    pub fn contains(&self, color_name: &str) -> bool {
        self.get(color_name).is_some()
    }

    /// Color names in sorted order.
    pub fn color_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// `(name, hex)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Normalize `#rrggbb` / `rrggbb` to `#RRGGBB`. Palettes carry no alpha.
fn normalize_palette_hex(hex: &str) -> Option<String> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", digits.to_ascii_uppercase()))
    } else {
        None
    }
}

/// Returns the names of all built-in palettes.
pub fn list_builtins() -> Vec<&'static str> {
    BUILTIN_SOURCES.iter().map(|(name, _)| *name).collect()
}

/// Load one built-in palette by name.
///
/// Returns `None` for unknown names and `Some(Err)` when the bundled table is
/// malformed, which is a packaging bug rather than a user error.
pub fn get_builtin(name: &str) -> Option<Result<Palette, PaletteError>> {
    BUILTIN_SOURCES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(builtin, source)| Palette::from_toml_str(builtin, source))
}
