//! Color token resolution
//!
//! Legend values are color tokens in one of these forms:
//! - Hex: `#RRGGBB`, `#RRGGBBAA` (the `#` may be omitted)
//! - Palette reference: `palette:color`, e.g. `tableau:blue`, `xkcd:light blue`
//!
//! Every token resolves to a canonical hex string: `#` followed by 6 or 8
//! uppercase hex digits. Shorthand forms (`#F00`) are rejected rather than
//! expanded.

use image::Rgba;
use thiserror::Error;

use crate::registry::PaletteRegistry;

/// Maximum number of candidate names listed in an unknown-color error.
pub const MAX_LISTED_COLORS: usize = 20;

/// Error type for color resolution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// `#` followed by something other than 6 or 8 hex digits
    #[error("invalid hex color format: '{0}' (expected #RRGGBB or #RRGGBBAA)")]
    InvalidColorFormat(String),
    /// Neither hex nor a palette reference
    #[error("unrecognized color format: '{token}'. Supported formats: hex (#FF0000, #FF000080){}", format_examples(.palettes))]
    UnrecognizedColorFormat { token: String, palettes: Vec<String> },
    /// The palette half of `palette:color` is not loaded
    #[error("palette '{name}' not found. Available palettes: {}", .available.join(", "))]
    UnknownPalette { name: String, available: Vec<String> },
    /// The color half of `palette:color` is not in the palette
    #[error("unknown color '{color}' in palette '{palette}'. {}", format_candidates(.candidates, .total))]
    UnknownPaletteColor { palette: String, color: String, candidates: Vec<String>, total: usize },
}

fn format_examples(palettes: &[String]) -> String {
    palettes.iter().map(|p| format!(", {}:colorname", p)).collect()
}

fn format_candidates(candidates: &[String], total: &usize) -> String {
    let total = *total;
    if candidates.len() >= total {
        format!("Available colors: {}", candidates.join(", "))
    } else {
        format!(
            "Closest colors: {} (and {} more)",
            candidates.join(", "),
            total - candidates.len()
        )
    }
}

/// Resolve a color token to a canonical `#RRGGBB` / `#RRGGBBAA` string.
///
/// # Examples
///
/// ```
/// use pixelate::color::resolve_color;
/// use pixelate::registry::PaletteRegistry;
///
/// let registry = PaletteRegistry::builtin().unwrap();
/// assert_eq!(resolve_color("#ff0000", &registry).unwrap(), "#FF0000");
/// assert_eq!(resolve_color("Tableau:Blue", &registry).unwrap(), "#1F77B4");
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the token is malformed or names an unknown
/// palette or color. Error messages list the valid alternatives.
pub fn resolve_color(token: &str, registry: &PaletteRegistry) -> Result<String, ColorError> {
    let token = token.trim();

    if let Some(digits) = token.strip_prefix('#') {
        return if is_hex_color(digits) {
            Ok(format!("#{}", digits.to_ascii_uppercase()))
        } else {
            Err(ColorError::InvalidColorFormat(token.to_string()))
        };
    }

    if let Some((palette_name, color_name)) = token.split_once(':') {
        return resolve_palette_color(palette_name, color_name, registry);
    }

    // Hex without the leading '#'
    if is_hex_color(token) {
        return Ok(format!("#{}", token.to_ascii_uppercase()));
    }

    Err(ColorError::UnrecognizedColorFormat {
        token: token.to_string(),
        palettes: registry.names().iter().map(|n| n.to_string()).collect(),
    })
}

fn resolve_palette_color(
    palette_name: &str,
    color_name: &str,
    registry: &PaletteRegistry,
) -> Result<String, ColorError> {
    let palette_name = palette_name.trim().to_lowercase();
    let color_name = color_name.trim().to_lowercase();

    let palette = registry.get(&palette_name).map_err(|_| ColorError::UnknownPalette {
        name: palette_name.clone(),
        available: registry.names().iter().map(|n| n.to_string()).collect(),
    })?;

    match palette.get(&color_name) {
        Some(hex) => Ok(hex.to_string()),
        None => {
            let names: Vec<&str> = palette.color_names().collect();
            Err(ColorError::UnknownPaletteColor {
                palette: palette_name,
                candidates: closest_names(&color_name, &names, MAX_LISTED_COLORS),
                color: color_name,
                total: names.len(),
            })
        }
    }
}

/// Pick up to `limit` names, all of them (sorted) if they fit, otherwise the
/// ones most similar to `target`.
fn closest_names(target: &str, names: &[&str], limit: usize) -> Vec<String> {
    if names.len() <= limit {
        return names.iter().map(|n| n.to_string()).collect();
    }

    let mut scored: Vec<(f64, &str)> =
        names.iter().map(|n| (strsim::jaro_winkler(target, n), *n)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, n)| n.to_string()).collect()
}

/// Exactly 6 or 8 hex digits.
fn is_hex_color(digits: &str) -> bool {
    matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode a hex color (`#RRGGBB` or `#RRGGBBAA`, `#` optional) into RGBA.
///
/// Six digits produce an opaque color; eight digits carry the alpha byte
/// verbatim.
///
/// ```
/// use pixelate::color::hex_to_rgba;
///
/// assert_eq!(hex_to_rgba("#FF0000").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(hex_to_rgba("FF000080").unwrap(), image::Rgba([255, 0, 0, 128]));
/// ```
pub fn hex_to_rgba(hex: &str) -> Result<Rgba<u8>, ColorError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !is_hex_color(digits) {
        return Err(ColorError::InvalidColorFormat(hex.to_string()));
    }

    let bytes = digits.as_bytes();
    let channel = |i: usize| parse_hex_digit(bytes[i]) * 16 + parse_hex_digit(bytes[i + 1]);
    let alpha = if bytes.len() == 8 { channel(6) } else { 255 };
    Ok(Rgba([channel(0), channel(2), channel(4), alpha]))
}

/// Value of an ASCII hex digit. Callers validate the input first.
fn parse_hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}
