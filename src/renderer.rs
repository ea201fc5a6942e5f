//! Grid rendering to image buffers
//!
//! Each grid cell becomes a solid `block_size × block_size` square. The canvas
//! starts fully transparent; cells whose color has zero alpha, or whose token
//! is configured as empty, are left unpainted.

use std::collections::{BTreeSet, HashMap};

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::color::{hex_to_rgba, ColorError};
use crate::models::{Legend, PixelGrid};

/// Default edge length of one cell, in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 10;

/// Largest canvas the renderer will allocate, in pixels (a 1 GiB RGBA buffer).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Background of a fresh canvas.
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Error type for rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("block size must be a positive integer, got {0}")]
    InvalidBlockSize(u32),
    #[error("canvas of {columns}x{rows} cells at block size {block_size} exceeds the maximum image size")]
    CanvasTooLarge { columns: usize, rows: usize, block_size: u32 },
    /// A grid token with no legend entry; only reachable when the grid did not come from the parser
    #[error("no color for token '{token}' at row {row}, column {column}")]
    UnresolvedCellToken { token: String, row: usize, column: usize },
    #[error("invalid color '{hex}' for token '{token}': {source}")]
    InvalidColor {
        token: String,
        hex: String,
        #[source]
        source: ColorError,
    },
}

/// Rendering parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Edge length of one cell, in pixels
    pub block_size: u32,
    /// Tokens that are never painted, whatever their color
    pub skip_tokens: BTreeSet<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, skip_tokens: BTreeSet::new() }
    }
}

impl RenderOptions {
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_skip_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_tokens.extend(tokens.into_iter().map(Into::into));
        self
    }
}

/// Render a grid with the default options and the given block size.
///
/// # Examples
///
/// ```
/// use pixelate::models::{Legend, PixelGrid};
/// use pixelate::renderer::render;
///
/// let legend = Legend::from([("x", "#FF0000")]);
/// let grid = PixelGrid::new(vec![vec!["x".to_string()]]).unwrap();
///
/// let image = render(&legend, &grid, 4).unwrap();
/// assert_eq!(image.dimensions(), (4, 4));
/// assert_eq!(image.get_pixel(3, 3).0, [255, 0, 0, 255]);
/// ```
pub fn render(legend: &Legend, grid: &PixelGrid, block_size: u32) -> Result<RgbaImage, RenderError> {
    render_with_options(legend, grid, &RenderOptions::default().with_block_size(block_size))
}

/// Render a grid to an RGBA image buffer.
///
/// The output is exactly `columns × block_size` by `rows × block_size`.
/// Colors are written verbatim, including their alpha channel; nothing is
/// blended.
pub fn render_with_options(
    legend: &Legend,
    grid: &PixelGrid,
    options: &RenderOptions,
) -> Result<RgbaImage, RenderError> {
    let block = options.block_size;
    if block == 0 {
        return Err(RenderError::InvalidBlockSize(block));
    }

    let (columns, rows) = (grid.width(), grid.height());
    let too_large = || RenderError::CanvasTooLarge { columns, rows, block_size: block };
    let width = u32::try_from(columns).ok().and_then(|c| c.checked_mul(block)).ok_or_else(too_large)?;
    let height = u32::try_from(rows).ok().and_then(|r| r.checked_mul(block)).ok_or_else(too_large)?;
    if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
        return Err(too_large());
    }

    let mut image = RgbaImage::from_pixel(width, height, TRANSPARENT);

    // None marks tokens that are never painted
    let mut color_cache: HashMap<&str, Option<Rgba<u8>>> = HashMap::new();

    for (row, column, token) in grid.cells() {
        let color = match color_cache.get(token) {
            Some(cached) => *cached,
            None => {
                let resolved = resolve_cell(legend, token, row, column, options)?;
                color_cache.insert(token, resolved);
                resolved
            }
        };

        if let Some(color) = color {
            // Fits in u32: bounded by the checked canvas size above
            fill_block(&mut image, column as u32 * block, row as u32 * block, block, color);
        }
    }

    Ok(image)
}

/// Color for a token, or `None` when the cell stays transparent.
fn resolve_cell(
    legend: &Legend,
    token: &str,
    row: usize,
    column: usize,
    options: &RenderOptions,
) -> Result<Option<Rgba<u8>>, RenderError> {
    let hex = legend.get(token).ok_or_else(|| RenderError::UnresolvedCellToken {
        token: token.to_string(),
        row,
        column,
    })?;

    if options.skip_tokens.contains(token) {
        return Ok(None);
    }

    let color = hex_to_rgba(hex).map_err(|source| RenderError::InvalidColor {
        token: token.to_string(),
        hex: hex.to_string(),
        source,
    })?;

    Ok(if color.0[3] == 0 { None } else { Some(color) })
}

fn fill_block(image: &mut RgbaImage, x0: u32, y0: u32, size: u32, color: Rgba<u8>) {
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            image.put_pixel(x, y, color);
        }
    }
}
