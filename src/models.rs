//! Data model shared by the parser and the renderer

use serde::Serialize;
use std::collections::BTreeMap;

use crate::parser::ParseError;

/// Per-document mapping from grid token to resolved hex color.
///
/// Values are canonical: `#` followed by 6 or 8 uppercase hex digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Legend {
    colors: BTreeMap<String, String>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved color for a grid token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.colors.contains_key(token)
    }

    /// `(token, hex)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl FromIterator<(String, String)> for Legend {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { colors: iter.into_iter().collect() }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Legend {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

/// A rectangular, non-empty grid of cell tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PixelGrid {
    rows: Vec<Vec<String>>,
}

impl PixelGrid {
    /// Build a grid, enforcing that it is non-empty and rectangular.
    ///
    /// Row numbers in errors are 1-based positions in `rows`.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(ParseError::MalformedDocument("pixel grid is empty".to_string())),
        };

        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != expected) {
            return Err(ParseError::InconsistentColumnCount {
                line: index + 1,
                expected,
                found: row.len(),
            });
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Every cell as `(row, column, token)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, token)| (y, x, token.as_str()))
        })
    }
}

/// A parsed document: its legend and the validated grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub legend: Legend,
    pub grid: PixelGrid,
}

impl Document {
    pub fn into_parts(self) -> (Legend, PixelGrid) {
        (self.legend, self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter().map(|row| row.iter().map(|s| s.to_string()).collect()).collect()
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = PixelGrid::new(rows(&[&["1", "0", "1"], &["0", "1", "0"]])).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.cells().count(), 6);
        assert_eq!(grid.cells().nth(4), Some((1, 1, "1")));
    }

    #[test]
    fn test_grid_rejects_ragged_rows() {
        let err = PixelGrid::new(rows(&[&["1", "0"], &["0"]])).unwrap_err();
        assert_eq!(err, ParseError::InconsistentColumnCount { line: 2, expected: 2, found: 1 });
    }

    #[test]
    fn test_grid_rejects_empty() {
        assert!(matches!(PixelGrid::new(vec![]), Err(ParseError::MalformedDocument(_))));
        assert!(matches!(PixelGrid::new(vec![vec![]]), Err(ParseError::MalformedDocument(_))));
    }

    #[test]
    fn test_legend_from_pairs() {
        let legend = Legend::from([("1", "#FF0000"), ("0", "#00000000")]);
        assert_eq!(legend.len(), 2);
        assert_eq!(legend.get("1"), Some("#FF0000"));
        assert!(!legend.contains("2"));
        assert_eq!(legend.tokens().collect::<Vec<_>>(), vec!["0", "1"]);
    }

    #[test]
    fn test_document_serializes_to_json() {
        let document = Document {
            legend: Legend::from([("1", "#FF0000")]),
            grid: PixelGrid::new(rows(&[&["1"]])).unwrap(),
        };
        let json = serde_json::to_string(&document).unwrap();
        assert_eq!(json, r##"{"legend":{"1":"#FF0000"},"grid":[["1"]]}"##);
    }
}
