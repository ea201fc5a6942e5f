//! Document parsing
//!
//! A document is a TOML legend wrapped in `+++` delimiters, followed by a
//! comma-separated grid of tokens:
//!
//! ```text
//! +++
//! "1" = "#FF0000"
//! "0" = "#00000000"
//! +++
//! 1,0,1
//! 0,1,0
//! ```
//!
//! Every string value in the legend is resolved through the palette registry.
//! Non-string values are metadata and are skipped.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::color::{resolve_color, ColorError};
use crate::models::{Document, Legend, PixelGrid};
use crate::registry::PaletteRegistry;

/// Marker that opens and closes the frontmatter block.
pub const FRONTMATTER_DELIMITER: &str = "+++";

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Missing delimiters or an empty grid
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// The frontmatter is not valid TOML
    #[error("invalid TOML in frontmatter: {0}")]
    MalformedLegend(String),
    /// A legend entry failed color resolution
    #[error("color definition '{key}' = '{value}' is invalid: {source}")]
    InvalidColor {
        key: String,
        value: String,
        #[source]
        source: ColorError,
    },
    /// A grid row differs in length from the first row
    #[error("inconsistent number of columns in pixel grid: expected {expected}, found {found} (line {line})")]
    InconsistentColumnCount { line: usize, expected: usize, found: usize },
    /// Grid tokens that have no legend entry, sorted
    #[error("undefined color keys in pixel grid: {}", .0.iter().map(|k| format!("'{}'", k)).collect::<Vec<_>>().join(", "))]
    UndefinedColorKey(Vec<String>),
}

/// Parse a document into its resolved legend and validated grid.
///
/// # Examples
///
/// ```
/// use pixelate::parser::parse_document;
/// use pixelate::registry::PaletteRegistry;
///
/// let registry = PaletteRegistry::builtin().unwrap();
/// let document = parse_document("+++\n\"1\" = \"tableau:blue\"\n+++\n1\n", &registry).unwrap();
/// assert_eq!(document.legend.get("1"), Some("#1F77B4"));
/// assert_eq!(document.grid.width(), 1);
/// ```
pub fn parse_document(text: &str, registry: &PaletteRegistry) -> Result<Document, ParseError> {
    let mut parts = text.splitn(3, FRONTMATTER_DELIMITER);
    let (Some(preamble), Some(frontmatter), Some(body)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedDocument(format!(
            "frontmatter must be wrapped in {} delimiters",
            FRONTMATTER_DELIMITER
        )));
    };

    let legend = parse_legend(frontmatter, registry)?;

    // Line number of the first body line, for error messages
    let body_offset = preamble.len() + frontmatter.len() + 2 * FRONTMATTER_DELIMITER.len();
    let first_line = text[..body_offset].matches('\n').count() + 1;
    let grid = parse_grid(body, first_line, &legend)?;

    debug!(
        colors = legend.len(),
        rows = grid.height(),
        columns = grid.width(),
        "parsed document"
    );

    Ok(Document { legend, grid })
}

/// Decode the frontmatter table and resolve its string values.
fn parse_legend(frontmatter: &str, registry: &PaletteRegistry) -> Result<Legend, ParseError> {
    let table: toml::Table =
        toml::from_str(frontmatter).map_err(|e| ParseError::MalformedLegend(e.message().to_string()))?;

    let mut colors = Vec::with_capacity(table.len());
    for (key, value) in table {
        let Some(token) = value.as_str() else {
            debug!(key = %key, kind = value.type_str(), "skipping non-string frontmatter entry");
            continue;
        };
        let hex = resolve_color(token, registry).map_err(|source| ParseError::InvalidColor {
            key: key.clone(),
            value: token.to_string(),
            source,
        })?;
        colors.push((key, hex));
    }

    Ok(colors.into_iter().collect())
}

/// Split the body into rows of trimmed tokens and validate them against the legend.
///
/// `first_line` is the document line number of the body's first line.
fn parse_grid(body: &str, first_line: usize, legend: &Legend) -> Result<PixelGrid, ParseError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut expected_cols = None;
    let mut undefined = BTreeSet::new();

    for (offset, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row: Vec<String> = line.split(',').map(|cell| cell.trim().to_string()).collect();

        match expected_cols {
            None => expected_cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(ParseError::InconsistentColumnCount {
                    line: first_line + offset,
                    expected,
                    found: row.len(),
                });
            }
            Some(_) => {}
        }

        for token in &row {
            if !legend.contains(token) {
                undefined.insert(token.clone());
            }
        }

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::MalformedDocument("pixel grid is empty".to_string()));
    }

    if !undefined.is_empty() {
        return Err(ParseError::UndefinedColorKey(undefined.into_iter().collect()));
    }

    PixelGrid::new(rows)
}
